//! Symbol table for the Hack assembler.
//!
//! Predefined symbols live in a PHF map resolved at compile time; labels
//! and variables discovered while assembling go into an ordinary `HashMap`.
//! Lookups check the predefined set first.

use phf::phf_map;
use std::collections::HashMap;

/// Symbols built into the Hack platform.
static PREDEFINED: phf::Map<&'static str, u16> = phf_map! {
    // Virtual registers
    "R0" => 0,
    "R1" => 1,
    "R2" => 2,
    "R3" => 3,
    "R4" => 4,
    "R5" => 5,
    "R6" => 6,
    "R7" => 7,
    "R8" => 8,
    "R9" => 9,
    "R10" => 10,
    "R11" => 11,
    "R12" => 12,
    "R13" => 13,
    "R14" => 14,
    "R15" => 15,

    // Stack machine pointers
    "SP" => 0,
    "LCL" => 1,
    "ARG" => 2,
    "THIS" => 3,
    "THAT" => 4,

    // Memory-mapped I/O
    "SCREEN" => 16384,
    "KBD" => 24576,
};

/// First RAM address handed out to user variables.
pub const FIRST_VARIABLE_ADDRESS: u16 = 16;

/// Maps label and variable names to 15-bit addresses.
///
/// # Example
/// ```
/// use hack_assembler::SymbolTable;
///
/// let mut symbols = SymbolTable::new();
/// assert_eq!(symbols.get("SP"), Some(0));
///
/// symbols.insert("LOOP", 100);
/// assert_eq!(symbols.get("LOOP"), Some(100));
/// assert_eq!(symbols.get("missing"), None);
/// ```
#[derive(Debug, Default)]
pub struct SymbolTable {
    user_symbols: HashMap<String, u16>,
}

impl SymbolTable {
    /// Creates a table containing only the predefined symbols.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_symbols: HashMap::with_capacity(32),
        }
    }

    /// Records a label or variable address. A later insert of the same
    /// name wins; predefined names cannot be rebound and are ignored.
    #[inline]
    pub fn insert(&mut self, symbol: &str, address: u16) {
        if !PREDEFINED.contains_key(symbol) {
            self.user_symbols.insert(symbol.to_string(), address);
        }
    }

    /// Looks up a symbol, predefined set first.
    #[inline]
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<u16> {
        PREDEFINED
            .get(symbol)
            .or_else(|| self.user_symbols.get(symbol))
            .copied()
    }

    /// Whether the symbol is already bound, predefined or user-defined.
    #[inline]
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        PREDEFINED.contains_key(symbol) || self.user_symbols.contains_key(symbol)
    }

    /// Resolves a symbol, allocating the next variable slot when unseen.
    ///
    /// This is the hot path of pass 2: every `@name` that is neither
    /// predefined nor a recorded label becomes a variable at
    /// `*next_address`, which is then advanced.
    #[inline]
    pub fn get_or_insert(&mut self, symbol: &str, next_address: &mut u16) -> u16 {
        use std::collections::hash_map::Entry;

        if let Some(&addr) = PREDEFINED.get(symbol) {
            return addr;
        }
        match self.user_symbols.entry(symbol.to_string()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let addr = *next_address;
                *next_address += 1;
                *e.insert(addr)
            }
        }
    }

    /// Number of user-defined symbols recorded so far.
    #[inline]
    #[must_use]
    pub fn user_symbol_count(&self) -> usize {
        self.user_symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_symbols() {
        let symbols = SymbolTable::new();

        assert_eq!(symbols.get("SP"), Some(0));
        assert_eq!(symbols.get("LCL"), Some(1));
        assert_eq!(symbols.get("ARG"), Some(2));
        assert_eq!(symbols.get("THIS"), Some(3));
        assert_eq!(symbols.get("THAT"), Some(4));
        assert_eq!(symbols.get("SCREEN"), Some(16384));
        assert_eq!(symbols.get("KBD"), Some(24576));

        for i in 0..=15 {
            assert_eq!(symbols.get(&format!("R{i}")), Some(i));
        }
    }

    #[test]
    fn test_missing_symbol_is_none() {
        let symbols = SymbolTable::new();
        assert_eq!(symbols.get("nowhere"), None);
        assert!(!symbols.contains("nowhere"));
    }

    #[test]
    fn test_insert_and_get() {
        let mut symbols = SymbolTable::new();
        symbols.insert("LOOP", 100);
        symbols.insert("END", 200);

        assert_eq!(symbols.get("LOOP"), Some(100));
        assert_eq!(symbols.get("END"), Some(200));
        assert!(symbols.contains("LOOP"));
        assert_eq!(symbols.user_symbol_count(), 2);
    }

    #[test]
    fn test_get_or_insert_allocates_sequentially() {
        let mut symbols = SymbolTable::new();
        let mut next = FIRST_VARIABLE_ADDRESS;

        assert_eq!(symbols.get_or_insert("i", &mut next), 16);
        assert_eq!(next, 17);

        // Second resolution returns the existing slot
        assert_eq!(symbols.get_or_insert("i", &mut next), 16);
        assert_eq!(next, 17);

        assert_eq!(symbols.get_or_insert("sum", &mut next), 17);
        assert_eq!(next, 18);
    }

    #[test]
    fn test_predefined_never_allocated() {
        let mut symbols = SymbolTable::new();
        let mut next = FIRST_VARIABLE_ADDRESS;

        assert_eq!(symbols.get_or_insert("SP", &mut next), 0);
        assert_eq!(next, FIRST_VARIABLE_ADDRESS);
        assert_eq!(symbols.user_symbol_count(), 0);
    }

    #[test]
    fn test_predefined_not_rebindable() {
        let mut symbols = SymbolTable::new();
        symbols.insert("SP", 999);
        assert_eq!(symbols.get("SP"), Some(0));
        assert_eq!(symbols.user_symbol_count(), 0);
    }
}
