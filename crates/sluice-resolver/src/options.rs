/// Options controlling configure-time validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
  /// Reject paths written by more than one producer. When off, conflicting
  /// writes are caught at run time as duplicate writes instead.
  pub strict_producers: bool,
}

impl ResolverOptions {
  pub fn strict() -> Self {
    Self {
      strict_producers: true,
    }
  }
}
