use mixgemm::dispatch::CATALOG;
use mixgemm::types::{ComputeScalar, ComputeType, DataType, KernelDataType, TypeTuple};
use mixgemm::{
    gemm_create, grouped_gemm_create, matmul, run_instance, Algorithm, ContractionProblem,
    DevicePtr, GemmData, GemmError, GemmType, GroupedMatmulArgs, Handle, HandleConfig,
    KernelBackend, MatmulArgs, MatrixRef, Operand, Result, ScalePtrs, Status, Stream,
};
use proptest::prelude::*;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Run(ContractionProblem),
    Create(ContractionProblem),
    CreateGrouped(Vec<ContractionProblem>),
    Launch(usize, Stream),
}

/// Records every call; optionally fails them all.
#[derive(Default)]
struct RecordingBackend {
    calls: RefCell<Vec<Call>>,
    fail_with: Option<Status>,
}

impl RecordingBackend {
    fn failing(status: Status) -> Self {
        Self {
            calls: RefCell::default(),
            fail_with: Some(status),
        }
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.borrow_mut().push(call);
        match self.fail_with {
            Some(status) => Err(GemmError::backend(status, "rejected")),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl KernelBackend for RecordingBackend {
    fn run(&self, _algo: &Algorithm, problem: &ContractionProblem, _stream: Stream) -> Result<()> {
        self.record(Call::Run(problem.clone()))
    }

    fn create(&self, problem: ContractionProblem) -> Result<(GemmData, usize)> {
        self.record(Call::Create(problem))?;
        Ok((GemmData::new(1usize), 1))
    }

    fn create_grouped(&self, problems: Vec<ContractionProblem>) -> Result<(GemmData, usize)> {
        let count = problems.len();
        self.record(Call::CreateGrouped(problems))?;
        Ok((GemmData::new(count), count))
    }

    fn launch(&self, _algo: &Algorithm, data: &GemmData, stream: Stream) -> Result<()> {
        let count = data.downcast_ref::<usize>().copied().unwrap_or(0);
        self.record(Call::Launch(count, stream))
    }
}

fn handle() -> Handle<RecordingBackend> {
    Handle::with_config(RecordingBackend::default(), HandleConfig::default())
}

fn args_for(key: TypeTuple) -> MatmulArgs {
    // 0x1000-aligned addresses satisfy every format
    MatmulArgs::new(
        key,
        16,
        8,
        32,
        MatrixRef::new(DevicePtr::new(0x10000), 16),
        MatrixRef::new(DevicePtr::new(0x20000), 32),
        MatrixRef::new(DevicePtr::new(0x30000), 16),
        MatrixRef::new(DevicePtr::new(0x40000), 16),
    )
    .scalars(DevicePtr::new(0x100), DevicePtr::new(0x108))
}

fn all_uniform_tuples() -> impl Iterator<Item = TypeTuple> {
    DataType::ALL.into_iter().flat_map(|a| {
        DataType::ALL.into_iter().flat_map(move |b| {
            DataType::ALL.into_iter().flat_map(move |out| {
                ComputeType::ALL
                    .into_iter()
                    .map(move |compute| TypeTuple::uniform_output(a, b, out, compute))
            })
        })
    })
}

fn in_catalog(key: &TypeTuple) -> bool {
    CATALOG.iter().any(|(k, _)| k == key)
}

#[test]
fn test_every_catalog_entry_runs() {
    for (key, kernel) in CATALOG {
        let h = handle();
        matmul(&h, &Algorithm::new(0, 0), &args_for(*key))
            .unwrap_or_else(|e| panic!("{key}: {e}"));

        let calls = h.backend().calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Run(p) => {
                assert_eq!(p.kernel, *kernel);
                assert_eq!(p.types, *key);
                assert_eq!(p.compute_type, key.compute);
                assert_eq!(p.scalar, key.compute.scalar_kind());
                assert_eq!(p.a.data_type, KernelDataType::from(key.a));
                assert_eq!(p.b.data_type, KernelDataType::from(key.b));
                assert_eq!(p.d.data_type, KernelDataType::from(key.d));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }
}

#[test]
fn test_unknown_tuples_never_reach_backend() {
    let h = handle();
    let mut rejected = 0;
    for key in all_uniform_tuples().filter(|k| !in_catalog(k)) {
        let err = matmul(&h, &Algorithm::new(0, 0), &args_for(key)).unwrap_err();
        assert_eq!(err.status(), Status::NotImplemented, "{key}");
        rejected += 1;
    }
    assert!(rejected > 0);
    assert!(h.backend().calls().is_empty());
}

#[test]
fn test_create_rejects_unknown_tuple() {
    let h = handle();
    let key = TypeTuple::uniform_output(DataType::F64, DataType::F64, DataType::F16, ComputeType::F64);
    assert!(matches!(
        gemm_create(&h, &args_for(key)),
        Err(GemmError::NotImplemented(_))
    ));
    assert!(h.backend().calls().is_empty());
}

#[test]
fn test_misaligned_operand_fails_before_backend() {
    let h = handle();
    for (key, _) in CATALOG {
        if key.a.alignment() > 1 {
            let mut args = args_for(*key);
            args.a.ptr = DevicePtr::new(0x10001);
            match matmul(&h, &Algorithm::new(0, 0), &args) {
                Err(GemmError::Misaligned { operand, .. }) => assert_eq!(operand, Operand::A),
                other => panic!("{key}: expected misaligned A, got {other:?}"),
            }
        }
        if key.d.alignment() > 1 {
            let mut args = args_for(*key);
            args.d.ptr = DevicePtr::new(0x40001);
            let err = gemm_create(&h, &args).unwrap_err();
            assert_eq!(err.status(), Status::InvalidSize);
        }
    }
    assert!(h.backend().calls().is_empty());
}

#[test]
fn test_workspace_is_clamped() {
    let key = TypeTuple::uniform_output(DataType::F32, DataType::F32, DataType::F32, ComputeType::F32);
    let h = handle();

    let args = args_for(key).workspace(DevicePtr::new(0x9000), 4096);
    matmul(&h, &Algorithm::new(3, 1024), &args).unwrap();
    matmul(&h, &Algorithm::new(3, 1 << 20), &args).unwrap();

    let sizes: Vec<usize> = h
        .backend()
        .calls()
        .into_iter()
        .map(|c| match c {
            Call::Run(p) => p.workspace_size,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(sizes, vec![1024, 4096]);
}

#[test]
fn test_create_uses_unit_alpha_with_vector() {
    let key = TypeTuple::uniform_output(DataType::I8, DataType::I8, DataType::I32, ComputeType::I32);
    let h = handle();

    let scales = ScalePtrs {
        alpha_vec: DevicePtr::new(0x800),
        ..ScalePtrs::default()
    };
    let args = args_for(key)
        .scales(scales)
        .workspace(DevicePtr::new(0x9000), 4096);
    let instance = gemm_create(&h, &args).unwrap();
    assert_eq!(instance.gemm_type, GemmType::Gemm);
    assert_eq!(instance.count, 1);

    match &h.backend().calls()[0] {
        Call::Create(p) => {
            assert_eq!(p.alpha, <i32 as ComputeScalar>::one_ptr());
            assert_eq!(p.scales.alpha_vec.addr(), 0x800);
            assert!(p.workspace.is_null());
            assert_eq!(p.workspace_size, 0);
        }
        other => panic!("unexpected call {other:?}"),
    }

    // The run path keeps the caller's alpha
    matmul(&h, &Algorithm::new(0, 0), &args).unwrap();
    match &h.backend().calls()[1] {
        Call::Run(p) => assert_eq!(p.alpha.addr(), 0x100),
        other => panic!("unexpected call {other:?}"),
    }
}

fn group_of(key: TypeTuple, ms: &[usize]) -> GroupedMatmulArgs {
    let mut group = GroupedMatmulArgs::new(key);
    for &m in ms {
        let mut args = args_for(key);
        args.m = m;
        group.push(&args);
    }
    group
}

#[test]
fn test_grouped_create_preserves_order() {
    let key = TypeTuple::uniform_output(DataType::F16, DataType::F8E4M3, DataType::F16, ComputeType::F32FastF16);
    let h = handle();

    let instance = grouped_gemm_create(&h, &group_of(key, &[4, 8, 12])).unwrap();
    assert_eq!(instance.gemm_type, GemmType::GroupedGemm);
    assert_eq!(instance.count, 3);

    match &h.backend().calls()[0] {
        Call::CreateGrouped(problems) => {
            let ms: Vec<usize> = problems.iter().map(|p| p.m).collect();
            assert_eq!(ms, vec![4, 8, 12]);
            assert!(problems.iter().all(|p| p.grouped_gemm));
        }
        other => panic!("unexpected call {other:?}"),
    }

    run_instance(&h, &Algorithm::new(0, 0), &instance).unwrap();
    assert_eq!(h.backend().calls()[1], Call::Launch(3, Stream::default()));
}

#[test]
fn test_launch_uses_handle_stream() {
    let key = TypeTuple::uniform_output(DataType::F32, DataType::F32, DataType::F32, ComputeType::F32);
    let mut h = handle();

    let instance = gemm_create(&h, &args_for(key)).unwrap();
    h.set_stream(Stream(7));
    assert_eq!(h.stream(), Stream(7));
    run_instance(&h, &Algorithm::new(0, 0), &instance).unwrap();

    assert_eq!(h.backend().calls()[1], Call::Launch(1, Stream(7)));
}

#[test]
fn test_grouped_length_mismatch_submits_nothing() {
    let key = TypeTuple::uniform_output(DataType::Bf16, DataType::Bf16, DataType::Bf16, ComputeType::F32);
    let h = handle();

    let mut group = group_of(key, &[2, 4, 6]);
    group.beta.truncate(2);
    match grouped_gemm_create(&h, &group) {
        Err(GemmError::LengthMismatch { field, expected, got }) => {
            assert_eq!((field, expected, got), ("beta", 3, 2));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.backend().calls().is_empty());
}

#[test]
fn test_grouped_misaligned_member_submits_nothing() {
    let key = TypeTuple::uniform_output(DataType::F64, DataType::F64, DataType::F64, ComputeType::F64);
    let h = handle();

    let mut group = group_of(key, &[2, 4, 6]);
    group.c[2].ptr = DevicePtr::new(0x30004);
    let err = grouped_gemm_create(&h, &group).unwrap_err();
    assert!(matches!(err, GemmError::Misaligned { operand: Operand::C, .. }));
    assert!(h.backend().calls().is_empty());
}

#[test]
fn test_backend_error_is_returned() {
    let key = TypeTuple::uniform_output(DataType::F32, DataType::F32, DataType::F32, ComputeType::F32FastXf32);
    for suppress in [false, true] {
        let config = HandleConfig::default().suppress_backend_errors(suppress);
        let h = Handle::with_config(RecordingBackend::failing(Status::InternalError), config);
        let err = matmul(&h, &Algorithm::new(0, 0), &args_for(key)).unwrap_err();
        assert_eq!(err.status(), Status::InternalError);
        assert_eq!(h.backend().calls().len(), 1);
    }
}

fn data_type() -> impl Strategy<Value = DataType> {
    prop::sample::select(DataType::ALL.to_vec())
}

fn compute_type() -> impl Strategy<Value = ComputeType> {
    prop::sample::select(ComputeType::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_lookup_agrees_with_catalog(
        a in data_type(),
        b in data_type(),
        c in data_type(),
        d in data_type(),
        compute in compute_type(),
    ) {
        let key = TypeTuple::new(a, b, c, d, compute);
        let h = handle();
        let result = matmul(&h, &Algorithm::new(0, 0), &args_for(key));
        prop_assert_eq!(result.is_ok(), in_catalog(&key));
        prop_assert_eq!(h.backend().calls().len(), usize::from(in_catalog(&key)));
    }
}
