//! Key input resolution: from conf lines and script sections to a single
//! table, and from key presses to commands.

pub mod binding;
pub mod builder;
pub mod conf_file;
pub mod extension;
pub mod filter;
pub mod key_name;
pub mod mapping;
pub mod registry;
pub mod resolver;
pub mod section;
pub mod section_stack;

pub use binding::InputBinding;
pub use binding::MenuItemLink;
pub use builder::ActiveBindings;
pub use builder::BindingTable;
pub use builder::EnableOrder;
pub use builder::ForcePrecedence;
pub use builder::PartialSequenceIndex;
pub use mapping::KeyMapping;
pub use registry::BindingRegistry;
pub use registry::BindingsChanged;
pub use registry::RegistryError;
pub use registry::RegistrySettings;
pub use resolver::KeyResolver;
pub use section::InputBindingOrigin;
pub use section::InputSection;
