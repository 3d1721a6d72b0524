use crate::backend::{Algorithm, KernelBackend};
use crate::dispatch::{build_problem, lookup, AlphaPolicy, DevicePtr};
use crate::error::{GemmError, Result};
use crate::handle::Handle;
use crate::problem::{ContractionProblem, GemmInstance, GemmType, ScalePtrs};
use crate::types::{DataType, Epilogue, Operation, TypeTuple};

/// Address and layout of one column-major operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatrixRef {
    pub ptr: DevicePtr,
    /// Leading dimension (distance between columns, in elements).
    pub ld: usize,
    /// Distance between consecutive batches, in elements.
    pub batch_stride: usize,
}

impl MatrixRef {
    pub fn new(ptr: DevicePtr, ld: usize) -> Self {
        Self {
            ptr,
            ld,
            batch_stride: 0,
        }
    }

    /// An absent operand.
    pub fn null() -> Self {
        Self::default()
    }

    pub fn batch_stride(mut self, batch_stride: usize) -> Self {
        self.batch_stride = batch_stride;
        self
    }
}

/// Arguments of a single GEMM request.
///
/// Computes `D = scale_d * (alpha * op(A) * op(B) + beta * C)` followed by
/// the epilogue, where `op(A)` is `m x k` and `op(B)` is `k x n`.
///
/// # Example
///
/// ```
/// use mixgemm::{DevicePtr, MatmulArgs, MatrixRef};
/// use mixgemm::types::{ComputeType, DataType, Operation, TypeTuple};
///
/// let key = TypeTuple::uniform_output(DataType::F16, DataType::F16, DataType::F32, ComputeType::F32);
/// let (a, b, c) = (vec![0u16; 8], vec![0u16; 8], vec![0f32; 4]);
///
/// let args = MatmulArgs::new(
///     key,
///     2,
///     2,
///     4,
///     MatrixRef::new(DevicePtr::from(a.as_ptr()), 4),
///     MatrixRef::new(DevicePtr::from(b.as_ptr()), 4),
///     MatrixRef::new(DevicePtr::from(c.as_ptr()), 2),
///     MatrixRef::new(DevicePtr::from(c.as_ptr()), 2),
/// )
/// .trans(Operation::T, Operation::N);
/// assert_eq!(args.trans_a, Operation::T);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MatmulArgs {
    pub types: TypeTuple,
    pub trans_a: Operation,
    pub trans_b: Operation,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: DevicePtr,
    pub beta: DevicePtr,
    pub a: MatrixRef,
    pub b: MatrixRef,
    pub c: MatrixRef,
    pub d: MatrixRef,
    pub e: MatrixRef,
    pub batch_count: usize,
    pub strided_batch: bool,
    pub grouped_gemm: bool,
    pub gradient: bool,
    pub bias: DevicePtr,
    pub bias_type: DataType,
    pub scales: ScalePtrs,
    pub epilogue: Epilogue,
    pub workspace: DevicePtr,
    pub workspace_size: usize,
}

impl MatmulArgs {
    /// A single, untransposed, strided-batch request with no epilogue.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        types: TypeTuple,
        m: usize,
        n: usize,
        k: usize,
        a: MatrixRef,
        b: MatrixRef,
        c: MatrixRef,
        d: MatrixRef,
    ) -> Self {
        Self {
            types,
            trans_a: Operation::N,
            trans_b: Operation::N,
            m,
            n,
            k,
            alpha: DevicePtr::NULL,
            beta: DevicePtr::NULL,
            a,
            b,
            c,
            d,
            e: MatrixRef::null(),
            batch_count: 1,
            strided_batch: true,
            grouped_gemm: false,
            gradient: false,
            bias: DevicePtr::NULL,
            bias_type: types.d,
            scales: ScalePtrs::default(),
            epilogue: Epilogue::Default,
            workspace: DevicePtr::NULL,
            workspace_size: 0,
        }
    }

    pub fn trans(mut self, trans_a: Operation, trans_b: Operation) -> Self {
        self.trans_a = trans_a;
        self.trans_b = trans_b;
        self
    }

    /// Host addresses of alpha and beta, at the compute scalar width.
    pub fn scalars(mut self, alpha: DevicePtr, beta: DevicePtr) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn batched(mut self, batch_count: usize, strided: bool) -> Self {
        self.batch_count = batch_count;
        self.strided_batch = strided;
        self
    }

    /// Auxiliary output for `*Aux` epilogues.
    pub fn aux(mut self, e: MatrixRef) -> Self {
        self.e = e;
        self
    }

    pub fn scales(mut self, scales: ScalePtrs) -> Self {
        self.scales = scales;
        self
    }

    pub fn epilogue(mut self, epilogue: Epilogue) -> Self {
        self.epilogue = epilogue;
        self
    }

    pub fn bias(mut self, bias: DevicePtr, bias_type: DataType) -> Self {
        self.bias = bias;
        self.bias_type = bias_type;
        self
    }

    pub fn gradient(mut self, gradient: bool) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn grouped(mut self, grouped_gemm: bool) -> Self {
        self.grouped_gemm = grouped_gemm;
        self
    }

    pub fn workspace(mut self, workspace: DevicePtr, size: usize) -> Self {
        self.workspace = workspace;
        self.workspace_size = size;
        self
    }
}

/// Arguments of a grouped GEMM: one entry per problem in every vector.
///
/// Formats, transposes and batching mode are shared by the whole group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMatmulArgs {
    pub types: TypeTuple,
    pub trans_a: Operation,
    pub trans_b: Operation,
    pub strided_batch: bool,
    pub grouped_gemm: bool,

    pub m: Vec<usize>,
    pub n: Vec<usize>,
    pub k: Vec<usize>,
    pub alpha: Vec<DevicePtr>,
    pub beta: Vec<DevicePtr>,
    pub a: Vec<MatrixRef>,
    pub b: Vec<MatrixRef>,
    pub c: Vec<MatrixRef>,
    pub d: Vec<MatrixRef>,
    pub e: Vec<MatrixRef>,
    pub batch_count: Vec<usize>,
    pub gradient: Vec<bool>,
    pub bias: Vec<DevicePtr>,
    pub bias_type: Vec<DataType>,
    pub scales: Vec<ScalePtrs>,
    pub epilogue: Vec<Epilogue>,
}

impl GroupedMatmulArgs {
    /// An empty group with the given formats.
    pub fn new(types: TypeTuple) -> Self {
        Self {
            types,
            trans_a: Operation::N,
            trans_b: Operation::N,
            strided_batch: true,
            grouped_gemm: true,
            m: Vec::new(),
            n: Vec::new(),
            k: Vec::new(),
            alpha: Vec::new(),
            beta: Vec::new(),
            a: Vec::new(),
            b: Vec::new(),
            c: Vec::new(),
            d: Vec::new(),
            e: Vec::new(),
            batch_count: Vec::new(),
            gradient: Vec::new(),
            bias: Vec::new(),
            bias_type: Vec::new(),
            scales: Vec::new(),
            epilogue: Vec::new(),
        }
    }

    /// Append one problem taken from a single request.
    ///
    /// Shared settings (formats, transposes, batching mode) come from the
    /// group, not from `args`.
    pub fn push(&mut self, args: &MatmulArgs) {
        self.m.push(args.m);
        self.n.push(args.n);
        self.k.push(args.k);
        self.alpha.push(args.alpha);
        self.beta.push(args.beta);
        self.a.push(args.a);
        self.b.push(args.b);
        self.c.push(args.c);
        self.d.push(args.d);
        self.e.push(args.e);
        self.batch_count.push(args.batch_count);
        self.gradient.push(args.gradient);
        self.bias.push(args.bias);
        self.bias_type.push(args.bias_type);
        self.scales.push(args.scales);
        self.epilogue.push(args.epilogue);
    }

    /// Number of problems, after checking every vector has that length.
    ///
    /// # Errors
    ///
    /// [`GemmError::LengthMismatch`] naming the first vector whose length
    /// differs from `m`'s; [`GemmError::InvalidValue`] for an empty group.
    pub fn problem_count(&self) -> Result<usize> {
        let expected = self.m.len();
        let lengths = [
            ("n", self.n.len()),
            ("k", self.k.len()),
            ("alpha", self.alpha.len()),
            ("beta", self.beta.len()),
            ("a", self.a.len()),
            ("b", self.b.len()),
            ("c", self.c.len()),
            ("d", self.d.len()),
            ("e", self.e.len()),
            ("batch_count", self.batch_count.len()),
            ("gradient", self.gradient.len()),
            ("bias", self.bias.len()),
            ("bias_type", self.bias_type.len()),
            ("scales", self.scales.len()),
            ("epilogue", self.epilogue.len()),
        ];
        for (field, got) in lengths {
            if got != expected {
                log::error!(
                    "grouped gemm argument {} has {} entries, expected {}",
                    field,
                    got,
                    expected
                );
                return Err(GemmError::LengthMismatch {
                    field,
                    expected,
                    got,
                });
            }
        }
        if expected == 0 {
            return Err(GemmError::InvalidValue("grouped gemm has no problems".into()));
        }
        Ok(expected)
    }

    /// The `i`-th problem as a standalone request.
    fn problem(&self, i: usize) -> MatmulArgs {
        MatmulArgs {
            types: self.types,
            trans_a: self.trans_a,
            trans_b: self.trans_b,
            m: self.m[i],
            n: self.n[i],
            k: self.k[i],
            alpha: self.alpha[i],
            beta: self.beta[i],
            a: self.a[i],
            b: self.b[i],
            c: self.c[i],
            d: self.d[i],
            e: self.e[i],
            batch_count: self.batch_count[i],
            strided_batch: self.strided_batch,
            grouped_gemm: self.grouped_gemm,
            gradient: self.gradient[i],
            bias: self.bias[i],
            bias_type: self.bias_type[i],
            scales: self.scales[i],
            epilogue: self.epilogue[i],
            workspace: DevicePtr::NULL,
            workspace_size: 0,
        }
    }
}

/// Run one GEMM now.
///
/// The workspace size forwarded to the backend is clamped to
/// `algo.max_workspace_bytes`.
///
/// # Errors
///
/// - [`GemmError::NotImplemented`] if the format tuple is not in the catalog
/// - [`GemmError::Misaligned`] if A, B, C or D is misaligned for its format
/// - any error returned by the backend
///
/// Nothing reaches the backend unless dispatch succeeds.
///
/// # Example
///
/// ```ignore
/// let handle = Handle::new(backend);
/// let algo = Algorithm::new(0, 1 << 20);
/// matmul(&handle, &algo, &args)?;
/// ```
pub fn matmul<B: KernelBackend>(
    handle: &Handle<B>,
    algo: &Algorithm,
    args: &MatmulArgs,
) -> Result<()> {
    let kernel = lookup(&args.types)?;
    let mut problem = build_problem(kernel, args, AlphaPolicy::AsGiven)?;
    problem.workspace_size = args.workspace_size.min(algo.max_workspace_bytes);

    log::debug!(
        "run {:?}: m={} n={} k={} batch={} workspace={}",
        kernel,
        problem.m,
        problem.n,
        problem.k,
        problem.batch_count,
        problem.workspace_size
    );

    handle.submit("gemm run", |backend| {
        backend.run(algo, &problem, handle.stream())
    })
}

/// Pre-stage one GEMM without running it.
///
/// When a per-row alpha vector is supplied, the staged alpha is one. The
/// staged problem carries no workspace.
pub fn gemm_create<B: KernelBackend>(handle: &Handle<B>, args: &MatmulArgs) -> Result<GemmInstance> {
    let kernel = lookup(&args.types)?;
    let problem = staged(build_problem(kernel, args, AlphaPolicy::UnitWithVector)?);

    let (data, count) = handle.submit("gemm create", |backend| backend.create(problem))?;
    Ok(GemmInstance {
        gemm_type: GemmType::Gemm,
        data,
        count,
    })
}

/// Pre-stage a group of GEMMs sharing one format tuple.
///
/// Every per-problem vector must have the same length; a mismatch fails
/// before any problem is built. Problems reach the backend in input order.
pub fn grouped_gemm_create<B: KernelBackend>(
    handle: &Handle<B>,
    args: &GroupedMatmulArgs,
) -> Result<GemmInstance> {
    let kernel = lookup(&args.types)?;
    let count = args.problem_count()?;

    let problems = (0..count)
        .map(|i| {
            build_problem(kernel, &args.problem(i), AlphaPolicy::UnitWithVector).map(staged)
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("grouped create {:?}: {} problems", kernel, problems.len());

    let (data, count) = handle.submit("grouped gemm create", |backend| {
        backend.create_grouped(problems)
    })?;
    Ok(GemmInstance {
        gemm_type: GemmType::GroupedGemm,
        data,
        count,
    })
}

/// Run a pre-staged instance.
pub fn run_instance<B: KernelBackend>(
    handle: &Handle<B>,
    algo: &Algorithm,
    instance: &GemmInstance,
) -> Result<()> {
    handle.submit("gemm launch", |backend| {
        backend.launch(algo, &instance.data, handle.stream())
    })
}

fn staged(mut problem: ContractionProblem) -> ContractionProblem {
    problem.workspace = DevicePtr::NULL;
    problem.workspace_size = 0;
    problem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComputeType;

    fn key() -> TypeTuple {
        TypeTuple::uniform_output(DataType::Bf16, DataType::Bf16, DataType::Bf16, ComputeType::F32)
    }

    fn args(m: usize) -> MatmulArgs {
        MatmulArgs::new(
            key(),
            m,
            2,
            2,
            MatrixRef::new(DevicePtr::new(0x100), m),
            MatrixRef::new(DevicePtr::new(0x200), 2),
            MatrixRef::new(DevicePtr::new(0x300), m),
            MatrixRef::new(DevicePtr::new(0x300), m),
        )
    }

    #[test]
    fn test_builder_defaults() {
        let a = args(4);
        assert_eq!(a.trans_a, Operation::N);
        assert_eq!(a.batch_count, 1);
        assert!(a.strided_batch);
        assert_eq!(a.bias_type, DataType::Bf16);
        assert!(a.e.ptr.is_null());

        let a = a.batched(3, false).epilogue(Epilogue::GeluAux).gradient(true);
        assert_eq!(a.batch_count, 3);
        assert!(!a.strided_batch);
        assert_eq!(a.epilogue, Epilogue::GeluAux);
        assert!(a.gradient);
    }

    #[test]
    fn test_group_push_and_count() {
        let mut group = GroupedMatmulArgs::new(key());
        group.push(&args(2));
        group.push(&args(4));
        assert_eq!(group.problem_count().unwrap(), 2);

        let second = group.problem(1);
        assert_eq!(second.m, 4);
        assert!(second.grouped_gemm);
        assert!(second.workspace.is_null());
    }

    #[test]
    fn test_group_length_mismatch() {
        let mut group = GroupedMatmulArgs::new(key());
        for m in [2, 3, 4] {
            group.push(&args(m));
        }
        group.k.pop();
        match group.problem_count() {
            Err(GemmError::LengthMismatch {
                field,
                expected,
                got,
            }) => {
                assert_eq!(field, "k");
                assert_eq!(expected, 3);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_group() {
        let group = GroupedMatmulArgs::new(key());
        assert!(matches!(group.problem_count(), Err(GemmError::InvalidValue(_))));
    }
}
