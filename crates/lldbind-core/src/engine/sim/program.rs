//! Scripted program descriptions for the simulated engine.
//!
//! A [`SimProgram`] lists the functions of an executable, the order in which
//! they are entered at runtime (the trace) and how the run ends. The engine
//! walks the trace on every continue and stops at the first entry matched by
//! an enabled breakpoint.

use std::path::Path;

use crate::types::BasicType;

/// Address of the first function in the text section.
pub const TEXT_BASE: u64 = 0x40_1000;
/// Bytes reserved per function in the text section.
pub const FUNCTION_STRIDE: u64 = 0x100;

/// Static type of a simulated variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimType
{
    Scalar
    {
        name: String,
        size: u64,
        signed: bool,
        basic: BasicType,
    },
    Pointer(Box<SimType>),
    Struct
    {
        name: String,
        fields: Vec<(String, SimType)>,
    },
    Array(Box<SimType>, u64),
    Void,
}

impl SimType
{
    #[must_use]
    pub fn int() -> Self
    {
        Self::scalar("int", 4, true, BasicType::Int)
    }

    #[must_use]
    pub fn unsigned_int() -> Self
    {
        Self::scalar("unsigned int", 4, false, BasicType::UnsignedInt)
    }

    #[must_use]
    pub fn long() -> Self
    {
        Self::scalar("long", 8, true, BasicType::Long)
    }

    #[must_use]
    pub fn unsigned_long() -> Self
    {
        Self::scalar("unsigned long", 8, false, BasicType::UnsignedLong)
    }

    #[must_use]
    pub fn char() -> Self
    {
        Self::scalar("char", 1, true, BasicType::Char)
    }

    #[must_use]
    pub fn bool() -> Self
    {
        Self::scalar("bool", 1, false, BasicType::Bool)
    }

    #[must_use]
    pub fn scalar(name: &str, size: u64, signed: bool, basic: BasicType) -> Self
    {
        SimType::Scalar {
            name: name.to_string(),
            size,
            signed,
            basic,
        }
    }

    #[must_use]
    pub fn pointer_to(pointee: SimType) -> Self
    {
        SimType::Pointer(Box::new(pointee))
    }

    #[must_use]
    pub fn array_of(element: SimType, len: u64) -> Self
    {
        SimType::Array(Box::new(element), len)
    }

    #[must_use]
    pub fn structure(name: &str, fields: Vec<(&str, SimType)>) -> Self
    {
        SimType::Struct {
            name: name.to_string(),
            fields: fields.into_iter().map(|(field, ty)| (field.to_string(), ty)).collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> String
    {
        match self {
            SimType::Scalar { name, .. } => name.clone(),
            SimType::Pointer(pointee) => match pointee.as_ref() {
                SimType::Pointer(_) => format!("{}*", pointee.name()),
                other => format!("{} *", other.name()),
            },
            SimType::Struct { name, .. } => name.clone(),
            SimType::Array(element, len) => format!("{}[{len}]", element.name()),
            SimType::Void => "void".to_string(),
        }
    }

    #[must_use]
    pub fn byte_size(&self) -> u64
    {
        match self {
            SimType::Scalar { size, .. } => *size,
            SimType::Pointer(_) => 8,
            SimType::Struct { fields, .. } => fields.iter().map(|(_, ty)| ty.byte_size()).sum(),
            SimType::Array(element, len) => element.byte_size() * len,
            SimType::Void => 0,
        }
    }

    #[must_use]
    pub fn basic_type(&self) -> BasicType
    {
        match self {
            SimType::Scalar { basic, .. } => *basic,
            SimType::Void => BasicType::Void,
            _ => BasicType::Invalid,
        }
    }

    #[must_use]
    pub fn is_signed(&self) -> bool
    {
        matches!(self, SimType::Scalar { signed: true, .. })
    }

    /// Children as `(name, type, byte offset)`.
    #[must_use]
    pub fn children(&self) -> Vec<(String, SimType, u64)>
    {
        match self {
            SimType::Struct { fields, .. } => {
                let mut offset = 0;
                fields
                    .iter()
                    .map(|(name, ty)| {
                        let child = (name.clone(), ty.clone(), offset);
                        offset += ty.byte_size();
                        child
                    })
                    .collect()
            }
            SimType::Array(element, len) => (0..*len)
                .map(|index| (format!("[{index}]"), element.as_ref().clone(), index * element.byte_size()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Scalar leaves in layout order, as `(type, byte offset)`.
    #[must_use]
    pub fn leaves(&self) -> Vec<(SimType, u64)>
    {
        match self {
            SimType::Struct { .. } | SimType::Array(..) => self
                .children()
                .into_iter()
                .flat_map(|(_, ty, offset)| {
                    ty.leaves()
                        .into_iter()
                        .map(move |(leaf, inner)| (leaf, offset + inner))
                })
                .collect(),
            SimType::Void => Vec::new(),
            other => vec![(other.clone(), 0)],
        }
    }
}

/// A variable of a simulated function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimVariable
{
    pub name: String,
    pub ty: SimType,
    /// Initial values of the scalar leaves, in layout order.
    pub values: Vec<i64>,
    pub argument: bool,
}

impl SimVariable
{
    #[must_use]
    pub fn local(name: &str, ty: SimType, value: i64) -> Self
    {
        Self {
            name: name.to_string(),
            ty,
            values: vec![value],
            argument: false,
        }
    }

    #[must_use]
    pub fn argument(name: &str, ty: SimType, value: i64) -> Self
    {
        Self {
            argument: true,
            ..Self::local(name, ty, value)
        }
    }

    /// Set the initial value of every scalar leaf.
    #[must_use]
    pub fn with_values(mut self, values: Vec<i64>) -> Self
    {
        self.values = values;
        self
    }
}

/// A function of a simulated executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimFunction
{
    pub name: String,
    pub file: Option<String>,
    pub line: u32,
    pub end_line: u32,
    pub variables: Vec<SimVariable>,
}

impl SimFunction
{
    #[must_use]
    pub fn new(name: &str, file: &str, line: u32, end_line: u32) -> Self
    {
        Self {
            name: name.to_string(),
            file: Some(file.to_string()),
            line,
            end_line: end_line.max(line),
            variables: Vec::new(),
        }
    }

    /// A function without debug information.
    #[must_use]
    pub fn stripped(name: &str) -> Self
    {
        Self {
            name: name.to_string(),
            file: None,
            line: 0,
            end_line: 0,
            variables: Vec::new(),
        }
    }

    #[must_use]
    pub fn variable(mut self, variable: SimVariable) -> Self
    {
        self.variables.push(variable);
        self
    }

    /// Whether `file` names this function's source file, by full path or suffix.
    #[must_use]
    pub fn in_file(&self, file: &str) -> bool
    {
        self.file.as_deref().is_some_and(|own| {
            own == file || own.ends_with(&format!("/{file}")) || file.ends_with(&format!("/{own}"))
        })
    }
}

/// How a simulated run ends once the trace is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEnding
{
    Exit(i32),
    Crash,
}

/// An executable known to the simulated engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimProgram
{
    pub path: String,
    pub triple: String,
    /// `functions[0]` is always `_start`.
    pub functions: Vec<SimFunction>,
    /// Function names in the order they are entered.
    pub trace: Vec<String>,
    pub ending: SimEnding,
    pub stdout: String,
    pub stderr: String,
    /// Number of state polls a transition stays in flight.
    pub settle_polls: u32,
    /// Never settle after launch.
    pub hang: bool,
    pub launch_error: Option<String>,
}

impl SimProgram
{
    /// A program whose `main` returns 0 without calling anything.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self
    {
        Self {
            path: path.into(),
            triple: "x86_64-unknown-linux-gnu".to_string(),
            functions: vec![
                SimFunction::stripped("_start"),
                SimFunction::new("main", "main.c", 10, 20)
                    .variable(SimVariable::argument("argc", SimType::int(), 1))
                    .variable(SimVariable::argument(
                        "argv",
                        SimType::pointer_to(SimType::pointer_to(SimType::char())),
                        0,
                    )),
            ],
            trace: vec!["main".to_string()],
            ending: SimEnding::Exit(0),
            stdout: String::new(),
            stderr: String::new(),
            settle_polls: 2,
            hang: false,
            launch_error: None,
        }
    }

    /// A small C program: `main` calls `compute(21)` twice and prints the result.
    ///
    /// `compute` has the argument `x` and the locals `result` and `point`
    /// (a `struct point { int x; int y; }`).
    #[must_use]
    pub fn demo(path: impl Into<String>) -> Self
    {
        let point = SimType::structure("point", vec![("x", SimType::int()), ("y", SimType::int())]);
        Self::new(path)
            .function(
                SimFunction::new("compute", "main.c", 3, 8)
                    .variable(SimVariable::argument("x", SimType::int(), 21))
                    .variable(SimVariable::local("result", SimType::int(), 42))
                    .variable(SimVariable::local("point", point, 0).with_values(vec![3, 4])),
            )
            .function(SimFunction::new("report", "util.c", 12, 15))
            .trace(["main", "compute", "compute", "report"])
            .stdout("result = 42\nresult = 42\n")
    }

    #[must_use]
    pub fn function(mut self, function: SimFunction) -> Self
    {
        self.functions.retain(|known| known.name != function.name);
        self.functions.push(function);
        self
    }

    /// Replace the runtime call trace.
    #[must_use]
    pub fn trace<I, S>(mut self, trace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trace = trace.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn exit_code(mut self, code: i32) -> Self
    {
        self.ending = SimEnding::Exit(code);
        self
    }

    #[must_use]
    pub fn crash(mut self) -> Self
    {
        self.ending = SimEnding::Crash;
        self
    }

    #[must_use]
    pub fn stdout(mut self, text: &str) -> Self
    {
        self.stdout = text.to_string();
        self
    }

    #[must_use]
    pub fn stderr(mut self, text: &str) -> Self
    {
        self.stderr = text.to_string();
        self
    }

    #[must_use]
    pub fn settle_polls(mut self, polls: u32) -> Self
    {
        self.settle_polls = polls;
        self
    }

    /// Stay in the launching state forever.
    #[must_use]
    pub fn hang(mut self) -> Self
    {
        self.hang = true;
        self
    }

    #[must_use]
    pub fn fail_launch(mut self, message: &str) -> Self
    {
        self.launch_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn triple_str(mut self, triple: &str) -> Self
    {
        self.triple = triple.to_string();
        self
    }

    /// The file name of the executable.
    #[must_use]
    pub fn file_name(&self) -> String
    {
        Path::new(&self.path)
            .file_name()
            .map_or_else(|| self.path.clone(), |name| name.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn function_index(&self, name: &str) -> Option<usize>
    {
        self.functions.iter().position(|function| function.name == name)
    }

    /// Load address of `functions[index]`.
    #[must_use]
    pub fn function_address(index: usize) -> u64
    {
        TEXT_BASE + index as u64 * FUNCTION_STRIDE
    }

    /// Index of the function whose text contains `address`.
    #[must_use]
    pub fn function_at(&self, address: u64) -> Option<usize>
    {
        let offset = address.checked_sub(TEXT_BASE)?;
        let index = usize::try_from(offset / FUNCTION_STRIDE).ok()?;
        (index < self.functions.len()).then_some(index)
    }

    /// Size of the text section.
    #[must_use]
    pub fn text_size(&self) -> u64
    {
        self.functions.len() as u64 * FUNCTION_STRIDE
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_type_names_and_sizes()
    {
        let char_pp = SimType::pointer_to(SimType::pointer_to(SimType::char()));
        assert_eq!(char_pp.name(), "char **");
        assert_eq!(SimType::array_of(SimType::int(), 4).name(), "int[4]");
        assert_eq!(SimType::array_of(SimType::int(), 4).byte_size(), 16);

        let point = SimType::structure("point", vec![("x", SimType::int()), ("y", SimType::long())]);
        assert_eq!(point.byte_size(), 12);
        let offsets: Vec<u64> = point.children().iter().map(|(_, _, offset)| *offset).collect();
        assert_eq!(offsets, [0, 4]);
    }

    #[test]
    fn test_program_layout()
    {
        let program = SimProgram::demo("/tmp/demo");
        assert_eq!(program.functions[0].name, "_start");
        let compute = program.function_index("compute").unwrap();
        let address = SimProgram::function_address(compute) + 0x10;
        assert_eq!(program.function_at(address), Some(compute));
        assert_eq!(program.function_at(TEXT_BASE - 1), None);
        assert_eq!(program.file_name(), "demo");
    }

    #[test]
    fn test_in_file_matches_suffix()
    {
        let function = SimFunction::new("main", "src/main.c", 1, 5);
        assert!(function.in_file("main.c"));
        assert!(function.in_file("/home/user/project/src/main.c"));
        assert!(!function.in_file("other.c"));
        assert!(!SimFunction::stripped("_start").in_file("main.c"));
    }
}
