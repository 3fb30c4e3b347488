/// Read-only settings shared by every compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Largest integer literal accepted by `push constant`.
    pub max_int_constant: u16,
    pub runtime: RuntimeNames,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_int_constant: 32767,
            runtime: RuntimeNames::default(),
        }
    }
}

/// Operating-system routines called by generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeNames {
    /// `alloc(size)`, used by constructors.
    pub alloc: String,
    pub multiply: String,
    pub divide: String,
    /// `new(maxLength)`, used by string constants.
    pub string_new: String,
    /// `appendChar(this, c)`, called once per string character.
    pub string_append_char: String,
}

impl Default for RuntimeNames {
    fn default() -> Self {
        Self {
            alloc: "Memory.alloc".into(),
            multiply: "Math.multiply".into(),
            divide: "Math.divide".into(),
            string_new: "String.new".into(),
            string_append_char: "String.appendChar".into(),
        }
    }
}
