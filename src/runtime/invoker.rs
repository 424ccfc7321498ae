//! Entry point selection and argument coercion.

use std::path::PathBuf;

use anyhow::Result;

use crate::runtime::{ArgValue, EntryPoint, Invocation, Loadable, LoadingSession, ParamKind};

/// What happened when a unit was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeOutcome {
    Completed(i32),
    /// Nothing matched the argument count
    NoEntryPoint,
}

/// Coerce one raw argument. Values that do not parse become
/// [`ArgValue::Absent`] rather than failing the call.
pub fn coerce(kind: ParamKind, raw: &str) -> ArgValue {
    match kind {
        ParamKind::Int => raw.parse().map(ArgValue::Int).unwrap_or(ArgValue::Absent),
        ParamKind::Float => raw.parse().map(ArgValue::Float).unwrap_or(ArgValue::Absent),
        ParamKind::Bool => ArgValue::Bool(raw.eq_ignore_ascii_case("true")),
        ParamKind::Char => raw.chars().next().map(ArgValue::Char).unwrap_or(ArgValue::Absent),
        ParamKind::Text => ArgValue::Text(raw.to_string()),
        ParamKind::Path if raw.is_empty() => ArgValue::Absent,
        ParamKind::Path => ArgValue::Path(PathBuf::from(raw)),
    }
}

/// Pick the entry point for `argv` and call it.
///
/// An entry point taking the whole argument vector wins. Otherwise the
/// first positional entry point whose arity equals `argv.len()` is called
/// with each argument coerced to its declared type.
pub fn invoke_entry_point(
    loadable: &dyn Loadable,
    session: &LoadingSession,
    argv: &[String],
) -> Result<InvokeOutcome> {
    let entries = loadable.entry_points();

    let invocation = if entries.contains(&EntryPoint::StringVector) {
        Invocation::StringVector(argv.to_vec())
    } else {
        let kinds = entries.iter().find_map(|entry| match entry {
            EntryPoint::Positional(kinds) if kinds.len() == argv.len() => Some(kinds),
            _ => None,
        });
        match kinds {
            Some(kinds) => Invocation::Positional(
                kinds
                    .iter()
                    .zip(argv)
                    .map(|(kind, raw)| (*kind, coerce(*kind, raw)))
                    .collect(),
            ),
            None => {
                tracing::debug!("no entry point among {:?} takes {} arguments", entries, argv.len());
                return Ok(InvokeOutcome::NoEntryPoint);
            }
        }
    };

    let code = loadable.call(session, &invocation)?;
    Ok(InvokeOutcome::Completed(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingLoadable;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce(ParamKind::Int, "42"), ArgValue::Int(42));
        assert_eq!(coerce(ParamKind::Int, "notanumber"), ArgValue::Absent);
        assert_eq!(coerce(ParamKind::Float, "2.5"), ArgValue::Float(2.5));
        assert_eq!(coerce(ParamKind::Bool, "TRUE"), ArgValue::Bool(true));
        assert_eq!(coerce(ParamKind::Bool, "yes"), ArgValue::Bool(false));
        assert_eq!(coerce(ParamKind::Char, "xyz"), ArgValue::Char('x'));
        assert_eq!(coerce(ParamKind::Char, ""), ArgValue::Absent);
        assert_eq!(coerce(ParamKind::Path, "a.txt"), ArgValue::Path(PathBuf::from("a.txt")));
        assert_eq!(coerce(ParamKind::Path, ""), ArgValue::Absent);
    }

    #[test]
    fn test_string_vector_preferred() {
        let loadable = RecordingLoadable::new(vec![
            EntryPoint::Positional(vec![ParamKind::Int]),
            EntryPoint::StringVector,
        ]);
        let outcome = invoke_entry_point(&loadable, &LoadingSession::new(), &args(&["1"])).unwrap();

        assert_eq!(outcome, InvokeOutcome::Completed(0));
        assert_eq!(loadable.invocations(), vec![Invocation::StringVector(args(&["1"]))]);
    }

    #[test]
    fn test_positional_coercion() {
        let loadable = RecordingLoadable::new(vec![
            EntryPoint::Positional(vec![ParamKind::Int]),
            EntryPoint::Positional(vec![ParamKind::Int, ParamKind::Text]),
        ]);
        invoke_entry_point(&loadable, &LoadingSession::new(), &args(&["42", "hi"])).unwrap();
        invoke_entry_point(&loadable, &LoadingSession::new(), &args(&["notanumber"])).unwrap();

        assert_eq!(
            loadable.invocations(),
            vec![
                Invocation::Positional(vec![
                    (ParamKind::Int, ArgValue::Int(42)),
                    (ParamKind::Text, ArgValue::Text("hi".into())),
                ]),
                Invocation::Positional(vec![(ParamKind::Int, ArgValue::Absent)]),
            ]
        );
    }

    #[test]
    fn test_no_matching_arity() {
        let loadable = RecordingLoadable::new(vec![EntryPoint::Positional(vec![ParamKind::Int])]);
        let outcome = invoke_entry_point(&loadable, &LoadingSession::new(), &args(&["1", "2"])).unwrap();

        assert_eq!(outcome, InvokeOutcome::NoEntryPoint);
        assert!(loadable.invocations().is_empty());
    }
}
