//! Two-phase command registry.
//!
//! While the command tree is being assembled, commands are created in any
//! order, attached to their parents, and have their descriptor sets
//! registered. A command's full path is only known once every ancestor is
//! attached, so path-keyed lookups live in a separate type:
//!
//! - [`CommandRegistry`] accepts registrations (the *assembling* phase).
//! - [`CommandRegistry::finalize`] consumes it and yields an
//!   [`ArrayFlagTable`] that only answers lookups (the *finalized* phase).
//!
//! Because `finalize` takes the registry by value, registering after
//! finalization and looking up before it are both unrepresentable.
//!
//! # Examples
//!
//! ```
//! use konflux_task_core::{CommandRegistry, DescriptorSet, ParamDescriptor};
//!
//! let mut registry = CommandRegistry::new("konflux-task-cli");
//! let build = registry.add_command("build");
//! let image = registry.add_command("image");
//!
//! let params = DescriptorSet::new([
//!     ParamDescriptor::string("image").with_short('i').required(),
//!     ParamDescriptor::string_array("labels").with_short('l'),
//! ])
//! .unwrap();
//! registry.register(build, &params).unwrap();
//!
//! // Parents may be attached after registration.
//! registry.attach(image, build).unwrap();
//! registry.attach(registry.root(), image).unwrap();
//!
//! let table = registry.finalize().unwrap();
//! assert_eq!(table.array_flags("image build"), ["--labels", "-l"]);
//! assert!(table.array_flags("image").is_empty());
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::DescriptorSet;
use crate::error::RegistryError;

/// Identifier assigned to a command by its [`CommandRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

impl CommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct CommandNode {
    name: String,
    parent: Option<CommandId>,
    /// `None` until the command registers its descriptors.
    array_flags: Option<Vec<String>>,
}

/// Registry of commands and their array-typed flags during tree assembly.
#[derive(Debug)]
pub struct CommandRegistry {
    nodes: Vec<CommandNode>,
}

impl CommandRegistry {
    /// Creates a registry holding only the root program command.
    ///
    /// The root name is never part of a command path.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![CommandNode {
                name: root_name.into(),
                parent: None,
                array_flags: None,
            }],
        }
    }

    /// Returns the id of the root command.
    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    /// Creates a detached command and assigns it an id.
    pub fn add_command(&mut self, name: impl Into<String>) -> CommandId {
        let id = CommandId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: name.into(),
            parent: None,
            array_flags: None,
        });
        id
    }

    /// Returns the name a command was created with.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownCommand`] for ids from another registry.
    pub fn name(&self, id: CommandId) -> Result<&str, RegistryError> {
        self.node(id).map(|node| node.name.as_str())
    }

    /// Attaches `child` under `parent`.
    ///
    /// # Errors
    ///
    /// Fails if either id is unknown, `child` is the root or already has a
    /// parent, or `parent` is `child` or one of its descendants.
    pub fn attach(&mut self, parent: CommandId, child: CommandId) -> Result<(), RegistryError> {
        self.node(parent)?;
        let child_node = self.node(child)?;
        if child == self.root() || child_node.parent.is_some() {
            return Err(RegistryError::AlreadyAttached(child_node.name.clone()));
        }

        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(RegistryError::Cycle {
                    parent: self.nodes[parent.0].name.clone(),
                    child: child_node.name.clone(),
                });
            }
            cursor = self.nodes[id.0].parent;
        }

        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Records which of a command's descriptors are array-typed.
    ///
    /// Both the long and the short spelling are recorded. Each command
    /// registers at most once.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] on a second call for the
    /// same command.
    pub fn register(&mut self, id: CommandId, params: &DescriptorSet) -> Result<(), RegistryError> {
        let node = self.node(id)?;
        if node.array_flags.is_some() {
            return Err(RegistryError::AlreadyRegistered(node.name.clone()));
        }
        self.nodes[id.0].array_flags = Some(params.array_flag_spellings());
        Ok(())
    }

    /// Computes every registered command's full path and freezes the lookup
    /// table.
    ///
    /// Call once, after the whole tree is attached and before the first
    /// argument vector is preprocessed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Detached`] if a registered command does not
    /// reach the root, or [`RegistryError::DuplicatePath`] if two registered
    /// commands share a path.
    pub fn finalize(self) -> Result<ArrayFlagTable, RegistryError> {
        let mut by_path = BTreeMap::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let Some(array_flags) = &node.array_flags else {
                continue;
            };
            let path = self.path_of(CommandId(index))?;
            debug!(path = %path, flags = ?array_flags, "registered array flags");
            if by_path.insert(path.clone(), array_flags.clone()).is_some() {
                return Err(RegistryError::DuplicatePath(path));
            }
        }

        debug!(commands = by_path.len(), "command registry finalized");
        Ok(ArrayFlagTable { by_path })
    }

    fn node(&self, id: CommandId) -> Result<&CommandNode, RegistryError> {
        self.nodes
            .get(id.0)
            .ok_or(RegistryError::UnknownCommand(id.0))
    }

    /// Joins ancestor names from below the root down to `id`.
    fn path_of(&self, id: CommandId) -> Result<String, RegistryError> {
        let mut segments = Vec::new();
        let mut cursor = id;
        while cursor != self.root() {
            let node = &self.nodes[cursor.0];
            segments.push(node.name.as_str());
            cursor = node
                .parent
                .ok_or_else(|| RegistryError::Detached(self.nodes[id.0].name.clone()))?;
        }
        segments.reverse();
        Ok(segments.join(" "))
    }
}

/// Finalized, path-keyed table of array-typed flag spellings.
///
/// Keys are space-joined command paths below the root (`"image build"`);
/// the root command itself has the empty path.
///
/// [`CommandRegistry::finalize`] is the only way to obtain one, so arguments
/// cannot be preprocessed against a half-assembled tree:
///
/// ```compile_fail
/// use konflux_task_core::{ArrayFlagTable, expand_array_args};
///
/// let table = ArrayFlagTable::default();
/// expand_array_args(&["apply-tags", "--tags", "a", "b"], &table);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayFlagTable {
    by_path: BTreeMap<String, Vec<String>>,
}

impl ArrayFlagTable {
    /// Returns the array flag spellings of the command at `path`, or an empty
    /// slice if none are registered there.
    pub fn array_flags(&self, path: &str) -> &[String] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns every registered command path in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }
}
