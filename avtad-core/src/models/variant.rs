use std::fmt::{self, Display};

///
/// Identity of one interval layout in a run: the real intervals or the
/// K-th shuffled control.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Variant {
    Observed,
    Shuffled(usize),
}

impl Variant {
    ///
    /// All variants of a run with `niter` shuffle iterations, real first.
    pub fn all(niter: usize) -> Vec<Variant> {
        std::iter::once(Variant::Observed)
            .chain((0..niter).map(Variant::Shuffled))
            .collect()
    }

    /// Column/file suffix: `""` for the real intervals, `"_shufK"` otherwise.
    pub fn suffix(&self) -> String {
        match self {
            Variant::Observed => String::new(),
            Variant::Shuffled(k) => format!("_shuf{}", k),
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Observed => write!(f, "observed"),
            Variant::Shuffled(k) => write!(f, "shuffle {}", k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_suffixes() {
        let suffixes: Vec<String> = Variant::all(2).iter().map(|v| v.suffix()).collect();
        assert_eq!(suffixes, vec!["", "_shuf0", "_shuf1"]);
    }

    #[rstest]
    fn test_zero_iterations_is_observed_only() {
        assert_eq!(Variant::all(0), vec![Variant::Observed]);
    }
}
