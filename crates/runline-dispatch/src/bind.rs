//! Argument binding.
//!
//! Turns the loose, untyped CLI arguments into the positional sequence a
//! target is called with. Binding is total: names nobody declared are
//! dropped, declared names nobody supplied come through as `None`.

use tracing::debug;

use crate::args::CommandArgs;
use crate::introspect::ParameterInfo;

/// Binds `args` against the declared parameter list.
///
/// Named arguments are looked up in declaration order. Positional input is
/// returned unchanged, whatever its length.
///
/// ```rust
/// use runline_dispatch::{bind, CommandArgs, NamedArguments, ParameterInfo};
///
/// let info = ParameterInfo {
///     param_list: vec!["greeting".into(), "name".into()],
///     has_callback: false,
/// };
/// let args = CommandArgs::Named(NamedArguments::from_tokens(["name=Ada", "extra=1"]));
/// assert_eq!(bind(&args, &info), vec![None, Some("Ada".to_string())]);
/// ```
pub fn bind(args: &CommandArgs, info: &ParameterInfo) -> Vec<Option<String>> {
    match args {
        CommandArgs::Positional(values) => values.clone(),
        CommandArgs::Named(named) => {
            let bound: Vec<Option<String>> = info
                .param_list
                .iter()
                .map(|param| named.get(param).map(str::to_string))
                .collect();

            if tracing::enabled!(tracing::Level::DEBUG) {
                let dropped: Vec<&str> = named
                    .iter()
                    .map(|(name, _)| name)
                    .filter(|name| !info.param_list.iter().any(|p| p == name))
                    .collect();
                if !dropped.is_empty() {
                    debug!(?dropped, "ignoring arguments with no matching parameter");
                }
            }

            bound
        }
    }
}
