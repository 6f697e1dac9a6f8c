mod options;
mod resolver;

pub use options::ResolverOptions;
pub use resolver::{Resolver, StandardResolver};
