// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Function calls.

use super::{Interpreter, RuntimeError};
use crate::builtins;
use crate::value::Value;

impl Interpreter {
    pub(super) fn call_value(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.tick()?;
        match callee {
            Value::Builtin(builtin) => {
                let result = builtins::call(builtin, args)?;
                if let Some(text) = result.printed {
                    self.write(&text);
                }
                Ok(result.value)
            }
            Value::Function(decl) => {
                if args.len() != decl.params.len() {
                    return Err(RuntimeError::type_error(format!(
                        "{}() takes {} argument{} but {} were given",
                        decl.name,
                        decl.params.len(),
                        if decl.params.len() == 1 { "" } else { "s" },
                        args.len()
                    )));
                }
                if self.call_depth >= self.max_call_depth {
                    return Err(RuntimeError::RecursionLimit(self.max_call_depth));
                }

                self.call_depth += 1;
                let saved = self.env.enter_call();
                for (param, arg) in decl.params.iter().zip(args) {
                    self.env.define(param.clone(), arg);
                }
                let result = decl.body.iter().try_for_each(|stmt| self.exec_stmt(stmt));
                self.env.leave_call(saved);
                self.call_depth -= 1;

                match result {
                    Ok(()) => Ok(Value::Nil),
                    Err(RuntimeError::Return(value)) => Ok(value),
                    Err(RuntimeError::Break) | Err(RuntimeError::Continue) => {
                        Err(RuntimeError::Syntax("'break' or 'continue' outside loop".to_string()))
                    }
                    Err(e) => Err(e),
                }
            }
            other => Err(RuntimeError::type_error(format!("'{}' is not callable", other.type_name()))),
        }
    }
}
