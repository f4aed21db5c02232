//! Macros for ergonomic state definitions.

/// Generate a `State` implementation for simple enums.
///
/// Variants are named after themselves unless given a label. Variants
/// listed under `final:` report [`State::is_final`](crate::core::State::is_final).
///
/// # Example
///
/// ```
/// use finite_machine::core::State;
/// use finite_machine::state_enum;
///
/// state_enum! {
///     pub enum Job {
///         Queued = "queued",
///         Running = "running",
///         Done,
///     }
///     final: [Done]
/// }
///
/// assert_eq!(Job::Queued.name(), "queued");
/// assert_eq!(Job::Done.name(), "Done");
/// assert!(Job::Done.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (@name $variant:ident) => {
        stringify!($variant)
    };
    (@name $variant:ident $label:literal) => {
        $label
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(= $label:literal)?
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $crate::state_enum!(@name $variant $($label)?)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }
        }
    };
}
