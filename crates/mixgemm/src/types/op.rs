/// Per-operand transpose flag.
///
/// `C` (conjugate transpose) behaves like `T` for real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    N,
    T,
    C,
}

impl Operation {
    #[inline]
    pub fn is_transposed(self) -> bool {
        !matches!(self, Operation::N)
    }
}

/// Fused post-processing applied by the kernel after the product.
///
/// The front end does not interpret epilogues; it only forwards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Epilogue {
    #[default]
    Default,
    Relu,
    Bias,
    ReluBias,
    Gelu,
    GeluBias,
    GeluAux,
    GeluAuxBias,
    DGelu,
    DGeluBgrad,
    BgradA,
    BgradB,
}

impl Epilogue {
    /// Backward-pass epilogues.
    pub fn is_gradient(self) -> bool {
        matches!(
            self,
            Epilogue::DGelu | Epilogue::DGeluBgrad | Epilogue::BgradA | Epilogue::BgradB
        )
    }

    /// Epilogues that read the bias vector.
    pub fn uses_bias(self) -> bool {
        matches!(
            self,
            Epilogue::Bias
                | Epilogue::ReluBias
                | Epilogue::GeluBias
                | Epilogue::GeluAuxBias
                | Epilogue::DGeluBgrad
                | Epilogue::BgradA
                | Epilogue::BgradB
        )
    }
}
