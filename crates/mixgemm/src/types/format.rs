use std::fmt;

/// Runtime tag for the storage format of a matrix operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    F64,
    F16,
    Bf16,
    /// 8-bit float, 4 exponent bits, 3 mantissa bits.
    F8E4M3,
    /// 8-bit float, 5 exponent bits, 2 mantissa bits.
    F8E5M2,
    I8,
    I32,
}

impl DataType {
    /// All format tags, in declaration order.
    pub const ALL: [DataType; 8] = [
        DataType::F32,
        DataType::F64,
        DataType::F16,
        DataType::Bf16,
        DataType::F8E4M3,
        DataType::F8E5M2,
        DataType::I8,
        DataType::I32,
    ];

    /// Size of one element in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DataType::F64 => 8,
            DataType::F32 | DataType::I32 => 4,
            DataType::F16 | DataType::Bf16 => 2,
            DataType::F8E4M3 | DataType::F8E5M2 | DataType::I8 => 1,
        }
    }

    /// Required address alignment of an element.
    ///
    /// Every supported format is naturally aligned.
    pub const fn alignment(self) -> usize {
        self.size_in_bytes()
    }

    /// Whether the format is a 16-bit float.
    pub const fn is_half_width_float(self) -> bool {
        matches!(self, DataType::F16 | DataType::Bf16)
    }

    pub const fn name(self) -> &'static str {
        match self {
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::F16 => "f16",
            DataType::Bf16 => "bf16",
            DataType::F8E4M3 => "f8_e4m3",
            DataType::F8E5M2 => "f8_e5m2",
            DataType::I8 => "i8",
            DataType::I32 => "i32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accumulation format requested for a multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeType {
    F32,
    /// f32 accumulation with xf32 reduced-precision inputs.
    F32FastXf32,
    /// f32 accumulation with inputs converted to f16, used by the
    /// mixed f16/f8 paths.
    F32FastF16,
    F64,
    I32,
}

impl ComputeType {
    pub const ALL: [ComputeType; 5] = [
        ComputeType::F32,
        ComputeType::F32FastXf32,
        ComputeType::F32FastF16,
        ComputeType::F64,
        ComputeType::I32,
    ];

    /// Width at which alpha, beta and the scale factors are read.
    pub const fn scalar_kind(self) -> ScalarKind {
        match self {
            ComputeType::F32 | ComputeType::F32FastXf32 | ComputeType::F32FastF16 => {
                ScalarKind::F32
            }
            ComputeType::F64 => ScalarKind::F64,
            ComputeType::I32 => ScalarKind::I32,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ComputeType::F32 => "f32",
            ComputeType::F32FastXf32 => "f32_fast_xf32",
            ComputeType::F32FastF16 => "f32_fast_f16",
            ComputeType::F64 => "f64",
            ComputeType::I32 => "i32",
        }
    }
}

impl fmt::Display for ComputeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Precision of the host scalars (alpha, beta, scales) attached to a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    F32,
    F64,
    I32,
}

impl ScalarKind {
    pub const fn size_in_bytes(self) -> usize {
        match self {
            ScalarKind::F64 => 8,
            ScalarKind::F32 | ScalarKind::I32 => 4,
        }
    }
}

/// Data type vocabulary understood by kernel backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelDataType {
    Float,
    Double,
    Half,
    BFloat16,
    /// e4m3 8-bit float.
    Float8,
    /// e5m2 8-bit float.
    BFloat8,
    Int8,
    Int32,
}

impl From<DataType> for KernelDataType {
    fn from(dtype: DataType) -> Self {
        match dtype {
            DataType::F32 => KernelDataType::Float,
            DataType::F64 => KernelDataType::Double,
            DataType::F16 => KernelDataType::Half,
            DataType::Bf16 => KernelDataType::BFloat16,
            DataType::F8E4M3 => KernelDataType::Float8,
            DataType::F8E5M2 => KernelDataType::BFloat8,
            DataType::I8 => KernelDataType::Int8,
            DataType::I32 => KernelDataType::Int32,
        }
    }
}

/// The full format key of a multiplication request.
///
/// C and D are carried separately because callers supply them separately;
/// every catalog entry requires them to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTuple {
    pub a: DataType,
    pub b: DataType,
    pub c: DataType,
    pub d: DataType,
    pub compute: ComputeType,
}

impl TypeTuple {
    pub const fn new(
        a: DataType,
        b: DataType,
        c: DataType,
        d: DataType,
        compute: ComputeType,
    ) -> Self {
        Self {
            a,
            b,
            c,
            d,
            compute,
        }
    }

    /// Shorthand for a tuple whose C and D formats are the same.
    pub const fn uniform_output(
        a: DataType,
        b: DataType,
        out: DataType,
        compute: ComputeType,
    ) -> Self {
        Self::new(a, b, out, out, compute)
    }
}

impl fmt::Display for TypeTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a={} b={} c={} d={} compute={}",
            self.a, self.b, self.c, self.d, self.compute
        )
    }
}
