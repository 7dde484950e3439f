use std::fmt::{self, Display, Formatter};

/// A backend-level name for a temporary value or a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Temp { prefix: &'static str, index: usize },
    Label { prefix: &'static str, index: usize },
}
impl Symbol {
    pub fn index(&self) -> usize {
        match self {
            Symbol::Temp { index, .. } | Symbol::Label { index, .. } => *index,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Symbol::Label { .. })
    }
}
impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Symbol::Temp { prefix, index } | Symbol::Label { prefix, index } => {
                write!(f, "{}{}", prefix, index)
            }
        }
    }
}

/// The prefixes used when generating symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStyle {
    pub temp_prefix: &'static str,
    pub label_prefix: &'static str,
}
impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            temp_prefix: "temp",
            label_prefix: "label",
        }
    }
}

/// Hands out temporaries and labels from two independent counters, both starting at zero.
#[derive(Debug)]
pub struct SymbolGenerator {
    style: SymbolStyle,
    temps: usize,
    labels: usize,
}
impl SymbolGenerator {
    pub fn new(style: SymbolStyle) -> Self {
        Self {
            style,
            temps: 0,
            labels: 0,
        }
    }

    /// Generates a new unique temporary.
    pub fn next_temp(&mut self) -> Symbol {
        let symbol = Symbol::Temp {
            prefix: self.style.temp_prefix,
            index: self.temps,
        };
        self.temps += 1;
        symbol
    }

    /// Generates a new unique label.
    pub fn next_label(&mut self) -> Symbol {
        let symbol = Symbol::Label {
            prefix: self.style.label_prefix,
            index: self.labels,
        };
        self.labels += 1;
        symbol
    }
}
