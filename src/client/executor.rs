//! Resolve-convert-call-render for one operator command.

use crate::catalog::{Command, CommandIndex, CommandList};
use crate::client::resolve::{Chooser, Resolution, ResolveOptions, resolve};
use crate::error::ClientError;
use crate::remote::Connection;
use crate::wire::{WireValue, decode, decode_result, encode, render};
use std::fmt;

/// What happened to a command. Only the value-bearing variants reached the
/// remote side; the rest are reported without any call being made.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Read { command: Command, value: WireValue },
    Written { command: Command },
    Invoked { command: Command, value: WireValue },
    NotFound { name: String },
    NotReadable { command: Command },
    NotWritable { command: Command },
    SelectionOutOfRange { selected: usize, candidates: usize },
}

impl Outcome {
    /// Operator-facing rendering of a returned value; `None` when there is
    /// nothing to print.
    pub fn render(&self) -> Option<String> {
        let (command, value) = match self {
            Outcome::Read { command, value } | Outcome::Invoked { command, value } => {
                (command, value)
            }
            _ => return None,
        };
        if *value == WireValue::Void {
            return None;
        }
        if let (true, WireValue::Object(json)) = (is_registry_list(command), value) {
            if let Ok(list) = serde_json::from_str::<CommandList>(json) {
                return Some(list.to_string());
            }
        }
        Some(render(value))
    }

    /// Reported conditions that the operator should see as a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            Outcome::Read { .. } | Outcome::Written { .. } | Outcome::Invoked { .. }
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Read { .. } | Outcome::Invoked { .. } => {
                f.write_str(&self.render().unwrap_or_default())
            }
            Outcome::Written { command } => write!(f, "{} updated", command.name),
            Outcome::NotFound { name } => write!(f, "Command not found: {name}"),
            Outcome::NotReadable { .. } => f.write_str("Sorry, attribute is not readable"),
            Outcome::NotWritable { .. } => f.write_str("Sorry, attribute is not writable"),
            Outcome::SelectionOutOfRange { .. } => f.write_str("Index out of range"),
        }
    }
}

fn is_registry_list(command: &Command) -> bool {
    command.owner.is_registry() && command.name == "list"
}

/// Client session over one connection. The catalog is fetched on first use
/// and cached until [`Executor::refresh`].
pub struct Executor<C> {
    connection: C,
    options: ResolveOptions,
    index: Option<CommandIndex>,
}

impl<C: Connection> Executor<C> {
    pub fn new(connection: C) -> Self {
        Self::with_options(connection, ResolveOptions::default())
    }

    pub fn with_options(connection: C, options: ResolveOptions) -> Self {
        Self {
            connection,
            options,
            index: None,
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Re-download the catalog.
    pub fn refresh(&mut self) -> Result<&CommandIndex, ClientError> {
        let list = self.connection.list()?;
        Ok(&*self.index.insert(CommandIndex::new(list)))
    }

    pub fn index(&mut self) -> Result<&CommandIndex, ClientError> {
        let index = match self.index.take() {
            Some(index) => index,
            None => CommandIndex::new(self.connection.list()?),
        };
        Ok(&*self.index.insert(index))
    }

    pub fn resolve(&mut self, name: &str, arg_count: usize) -> Result<Resolution, ClientError> {
        let options = self.options;
        Ok(resolve(self.index()?, name, arg_count, options))
    }

    /// Resolve `name` against the catalog and run it with `args`.
    pub fn execute(
        &mut self,
        name: &str,
        args: &[String],
        chooser: &mut dyn Chooser,
    ) -> Result<Outcome, ClientError> {
        let command = match self.resolve(name, args.len())? {
            Resolution::NotFound => {
                return Ok(Outcome::NotFound {
                    name: name.to_string(),
                });
            }
            Resolution::Single(command) => command,
            Resolution::Ambiguous(candidates) => {
                let selected = chooser.choose(&candidates);
                match selected.checked_sub(1).and_then(|i| candidates.get(i)) {
                    Some(command) => command.clone(),
                    None => {
                        return Ok(Outcome::SelectionOutOfRange {
                            selected,
                            candidates: candidates.len(),
                        });
                    }
                }
            }
        };
        self.dispatch(&command, args)
    }

    /// Run an already-resolved command. Arguments are converted before any
    /// remote call; a conversion failure means nothing was sent.
    pub fn dispatch(&self, command: &Command, args: &[String]) -> Result<Outcome, ClientError> {
        if command.is_attribute() {
            return self.dispatch_attribute(command, args);
        }

        if args.len() != command.args.len() {
            return Err(ClientError::ArgumentCount {
                command: command.name.clone(),
                expected: command.args.len(),
                supplied: args.len(),
            });
        }
        let encoded = command
            .args
            .iter()
            .zip(args)
            .map(|(arg, text)| decode(&arg.ty, text).map(|value| encode(&value)))
            .collect::<Result<Vec<_>, _>>()?;
        let raw = self
            .connection
            .invoke(&command.owner, &command.name, &encoded, &command.signature())?;
        let value = decode_result(&command.returns.ty, &raw)?;
        Ok(Outcome::Invoked {
            command: command.clone(),
            value,
        })
    }

    fn dispatch_attribute(&self, command: &Command, args: &[String]) -> Result<Outcome, ClientError> {
        match args {
            [] if command.is_readable() => {
                let raw = self.connection.get_attribute(&command.owner, &command.name)?;
                let value = decode_result(&command.returns.ty, &raw)?;
                Ok(Outcome::Read {
                    command: command.clone(),
                    value,
                })
            }
            [] => Ok(Outcome::NotReadable {
                command: command.clone(),
            }),
            [input] if command.is_writable() => {
                let value = decode(&command.returns.ty, input)?;
                self.connection
                    .set_attribute(&command.owner, &command.name, &encode(&value))?;
                Ok(Outcome::Written {
                    command: command.clone(),
                })
            }
            [_] => Ok(Outcome::NotWritable {
                command: command.clone(),
            }),
            _ => Err(ClientError::ArgumentCount {
                command: command.name.clone(),
                expected: 1,
                supplied: args.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArgumentDescriptor, OwnerName};
    use crate::error::{ConversionError, RemoteError};
    use crate::wire::{BaseType, TypeDescriptor};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        commands: Vec<Command>,
        calls: Mutex<Vec<String>>,
    }

    impl Connection for Recording {
        fn get_attribute(&self, owner: &OwnerName, name: &str) -> Result<String, RemoteError> {
            if owner.is_registry() {
                return Ok(serde_json::to_string(&CommandList::new(self.commands.clone()))?);
            }
            self.calls.lock().push(format!("get {owner} {name}"));
            Ok("7".into())
        }

        fn set_attribute(&self, owner: &OwnerName, name: &str, value: &str) -> Result<(), RemoteError> {
            self.calls.lock().push(format!("set {owner} {name} {value}"));
            Ok(())
        }

        fn invoke(
            &self,
            owner: &OwnerName,
            name: &str,
            args: &[String],
            signature: &[TypeDescriptor],
        ) -> Result<String, RemoteError> {
            let types: Vec<_> = signature.iter().map(ToString::to_string).collect();
            self.calls
                .lock()
                .push(format!("invoke {owner} {name} {args:?} {types:?}"));
            Ok(String::new())
        }
    }

    fn int() -> TypeDescriptor {
        TypeDescriptor::scalar(BaseType::Integer)
    }

    fn executor(commands: Vec<Command>) -> Executor<Recording> {
        Executor::new(Recording {
            commands,
            ..Default::default()
        })
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn no_choice(_: &[Command]) -> usize {
        panic!("no selection expected")
    }

    fn calls(executor: &Executor<Recording>) -> Vec<String> {
        executor.connection().calls.lock().clone()
    }

    #[test]
    fn read_only_attribute_is_never_written() {
        let owner = OwnerName::from("app:type=A");
        let mut exec = executor(vec![Command::attribute(owner, "size", "", int(), true, false)]);

        let read = exec.execute("size", &[], &mut no_choice).unwrap();
        assert_eq!(read.render().as_deref(), Some("7"));

        let write = exec.execute("size", &strings(&["3"]), &mut no_choice).unwrap();
        assert!(matches!(write, Outcome::NotWritable { .. }));
        assert!(write.is_failure());
        assert_eq!(calls(&exec), vec!["get app:type=A size"]);
    }

    #[test]
    fn write_only_attribute_reports_not_readable() {
        let owner = OwnerName::from("app:type=A");
        let mut exec = executor(vec![Command::attribute(owner, "limit", "", int(), false, true)]);
        let outcome = exec.execute("limit", &[], &mut no_choice).unwrap();
        assert_eq!(outcome.to_string(), "Sorry, attribute is not readable");

        exec.execute("limit", &strings(&["9"]), &mut no_choice).unwrap();
        assert_eq!(calls(&exec), vec!["set app:type=A limit 9"]);
    }

    #[test]
    fn conversion_failure_stops_before_the_call() {
        let owner = OwnerName::from("app:type=A");
        let op = Command::operation(
            owner,
            "scale",
            "",
            TypeDescriptor::VOID,
            vec![ArgumentDescriptor::new("factor", "", int())],
        );
        let mut exec = executor(vec![op]);
        let err = exec.execute("scale", &strings(&["two"]), &mut no_choice).unwrap_err();
        assert!(matches!(err, ClientError::Conversion(ConversionError::Parse { .. })));
        assert!(calls(&exec).is_empty());

        let ok = exec.execute("scale", &strings(&[" 2 "]), &mut no_choice).unwrap();
        assert_eq!(ok.render(), None);
        assert_eq!(
            calls(&exec),
            vec![r#"invoke app:type=A scale ["2"] ["Integer"]"#]
        );
    }

    #[test]
    fn selection_picks_candidate_by_position() {
        let status = |owner: &str| {
            Command::operation(owner.into(), "status", "", TypeDescriptor::VOID, Vec::new())
        };
        let mut exec = executor(vec![status("app:type=First"), status("app:type=Second")]);

        exec.execute("status", &[], &mut |c: &[Command]| {
            assert_eq!(c.len(), 2);
            1
        })
        .unwrap();
        exec.execute("status", &[], &mut |_: &[Command]| 2).unwrap();
        assert_eq!(
            calls(&exec),
            vec![
                "invoke app:type=First status [] []",
                "invoke app:type=Second status [] []"
            ]
        );

        let out = exec.execute("status", &[], &mut |_: &[Command]| 3).unwrap();
        assert_eq!(
            out,
            Outcome::SelectionOutOfRange {
                selected: 3,
                candidates: 2
            }
        );
        let out = exec.execute("status", &[], &mut |_: &[Command]| 0).unwrap();
        assert_eq!(out.to_string(), "Index out of range");
        assert_eq!(calls(&exec).len(), 2);
    }

    #[test]
    fn fallback_onto_operation_checks_arity() {
        let reset = Command::operation("app:type=A".into(), "reset", "", TypeDescriptor::VOID, Vec::new());
        let mut exec = executor(vec![reset]);
        let err = exec.execute("reset", &strings(&["now"]), &mut no_choice).unwrap_err();
        assert!(matches!(
            err,
            ClientError::ArgumentCount {
                expected: 0,
                supplied: 1,
                ..
            }
        ));

        let missing = exec.execute("restart", &[], &mut no_choice).unwrap();
        assert_eq!(missing.to_string(), "Command not found: restart");
    }

    #[test]
    fn registry_list_renders_grouped() {
        let mut exec = executor(Vec::new());
        let list = Command::attribute(OwnerName::registry(), "list", "", TypeDescriptor::OBJECT, true, false);
        let outcome = Outcome::Read {
            command: list,
            value: WireValue::Object(
                serde_json::to_string(&CommandList::new(vec![Command::operation(
                    "app:type=A".into(),
                    "go",
                    "",
                    TypeDescriptor::VOID,
                    Vec::new(),
                )]))
                .unwrap(),
            ),
        };
        assert_eq!(outcome.render().unwrap(), "A:\n\tcommand: go\n\t\targs: []\n");
        assert!(exec.refresh().unwrap().commands().is_empty());
    }
}
