//! Parameter declaration, argument rewriting and value resolution for
//! task-style CLIs.
//!
//! Every subcommand declares its parameters once, as a table of
//! [`ParamDescriptor`]s. From that table this crate:
//!
//! - records which flags are array-typed per command path
//!   ([`CommandRegistry`], finalized into an [`ArrayFlagTable`]);
//! - rewrites raw arguments so `--tags a b c` reaches the flag parser as
//!   `--tags a --tags b --tags c` ([`expand_array_args`]);
//! - installs matching clap flags ([`bind_flags`], `clap` feature);
//! - resolves each value by precedence (flag, environment, default) into a
//!   typed struct ([`ParamBindings`], [`BoundParams::resolve`]).
//!
//! # Example
//!
//! ```
//! use clap::Command;
//! use konflux_task_core::*;
//!
//! #[derive(Debug, Default)]
//! struct ApplyTagsParams {
//!     image_url: String,
//!     tags: Vec<String>,
//! }
//!
//! let params = DescriptorSet::new([
//!     ParamDescriptor::string("image-url").with_short('i').with_env("IMAGE_URL").required(),
//!     ParamDescriptor::string_array("tags").with_short('t').with_env("TAGS"),
//! ])
//! .unwrap();
//!
//! // Assemble the tree, then finalize.
//! let mut registry = CommandRegistry::new("tool");
//! let apply = registry.add_command("apply-tags");
//! registry.attach(registry.root(), apply).unwrap();
//! registry.register(apply, &params).unwrap();
//! let table = registry.finalize().unwrap();
//!
//! let cli = Command::new("tool")
//!     .subcommand(bind_flags(Command::new("apply-tags"), &params).unwrap());
//!
//! let argv = expand_array_args(&["apply-tags", "-i", "quay.io/org/app", "--tags", "v1", "latest"], &table);
//! let matches = cli.try_get_matches_from(std::iter::once("tool".to_string()).chain(argv)).unwrap();
//! let (_, sub) = matches.subcommand().unwrap();
//!
//! let resolved = ParamBindings::<ApplyTagsParams>::new()
//!     .string("image-url", |p, v| p.image_url = v)
//!     .string_array("tags", |p, v| p.tags = v)
//!     .bind(&params)
//!     .unwrap()
//!     .resolve(sub, &std::collections::HashMap::<String, String>::new())
//!     .unwrap();
//!
//! assert_eq!(resolved.image_url, "quay.io/org/app");
//! assert_eq!(resolved.tags, ["v1", "latest"]);
//! ```

#[cfg(feature = "clap")]
mod binder;
mod error;
mod preprocess;
mod registry;
mod resolve;
mod types;
mod validate;

#[cfg(feature = "clap")]
pub use binder::bind_flags;
pub use error::{BindingError, RegistryError, ResolveError};
pub use preprocess::{ARG_SEPARATOR, expand_array_args};
pub use registry::{ArrayFlagTable, CommandId, CommandRegistry};
pub use resolve::{
    BoundParams, EnvSource, FlagSource, Origin, ParamBindings, ParamValue, ProcessEnv, Setter,
    resolve_value, split_list,
};
pub use types::*;
pub use validate::{ValidationError, validate_descriptors};
