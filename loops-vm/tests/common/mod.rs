#![allow(dead_code)]

use loops_vm::{EngineConfig, LoopMode, Machine};

/// The three ways a loop can reach the machine.
#[derive(Copy, Clone, Debug)]
pub enum Mode {
    /// Loops compiled while clauses and queries are read
    Ahead,
    /// Loops compiled when the `do/2` goal is called
    Runtime,
    /// Loops run from their plan without a generated procedure
    Interpreted,
}

impl Mode {
    pub fn config(self) -> EngineConfig {
        match self {
            Mode::Ahead => EngineConfig::default(),
            Mode::Runtime => EngineConfig::default().with_expand_ahead(false),
            Mode::Interpreted => EngineConfig::default().with_loop_mode(LoopMode::Interpreted),
        }
    }

    pub fn machine(self) -> Machine {
        Machine::new(self.config()).expect("library should load")
    }
}

/// Rendered values of `var` in every answer to `query`.
pub fn values(machine: &mut Machine, query: &str, var: &str) -> Vec<String> {
    machine
        .query(query)
        .unwrap_or_else(|err| panic!("{query}: {err}"))
        .iter()
        .map(|answer| {
            answer
                .get(var)
                .unwrap_or_else(|| panic!("{var} is not named in {query}"))
                .to_string()
        })
        .collect()
}

/// The single value of `var` in the only answer to `query`.
pub fn only(mode: Mode, query: &str, var: &str) -> String {
    let mut machine = mode.machine();
    let mut found = values(&mut machine, query, var);
    assert_eq!(found.len(), 1, "{mode:?}: {query} gave {found:?}");
    found.remove(0)
}
