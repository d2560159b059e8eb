use proc_macro::TokenStream;

mod component;

/// Derive macro implementing `componentree::Component` for a struct
///
/// Every field is a constructor parameter and must say how it is satisfied:
/// `#[param(inject)]` for another component (the field must be an `Arc<T>`),
/// or `#[param(data)]` for a value deserialized from a parameter source or
/// from caller-supplied data.
///
/// # Example
/// ```ignore
/// use componentree::prelude::*;
///
/// #[derive(Component)]
/// #[component(service, tag = "storage", init = "connect", base = "app")]
/// pub struct UserRepository {
///     #[param(inject)]
///     pool: Arc<ConnectionPool>,
///     #[param(data = "users_table", source = "ConfigService")]
///     table: String,
/// }
///
/// impl UserRepository {
///     async fn connect(&self) -> anyhow::Result<()> {
///         self.pool.ping().await
///     }
/// }
/// ```
///
/// Struct attributes:
/// - `name = "..."`: registry name (defaults to the struct name)
/// - `service`: cache a single instance
/// - `tag = "..."`, `implements = "..."`: repeatable
/// - `init = "method"`: repeatable, run in order after construction
/// - `parameter_source`: the struct implements `ParameterSource`
/// - `base = "..."`: submit the component for `InventoryLoader`
#[proc_macro_derive(Component, attributes(component, param))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    component::derive_component(input)
}
