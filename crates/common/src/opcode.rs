//! Opcode definitions for the CPython 2.7 instruction set.
//!
//! Byte values and mnemonics follow CPython 2.7's `Include/opcode.h` and the
//! `dis.opname` table. Opcodes at or above [`HAVE_ARGUMENT`] are followed in
//! the instruction stream by a 16-bit little-endian operand.

use crate::error::DecodeError;

/// First opcode value that takes an operand.
pub const HAVE_ARGUMENT: u8 = 90;

/// The comparison-operator table indexed by `COMPARE_OP` operands.
///
/// This is CPython's `cmp_op` tuple. Index 11 (`"BAD"`) is a placeholder the
/// compiler never emits but the table still defines.
pub const CMP_OP: [&str; 12] = [
    "<",
    "<=",
    "==",
    "!=",
    ">",
    ">=",
    "in",
    "not in",
    "is",
    "is not",
    "exception match",
    "BAD",
];

/// How an opcode's raw 16-bit operand maps to a symbolic value.
///
/// Each opcode identity carries exactly one of these classes; the mapping is
/// total and computed statically, never re-derived per instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Index into the code object's constant table.
    Constant,
    /// Index into the code object's name table (globals/attributes/imports).
    NameRef,
    /// Index into the code object's local-variable name table.
    Local,
    /// Index into the fixed [`CMP_OP`] table.
    Compare,
    /// The operand is itself an absolute bytecode offset.
    JumpAbsolute,
    /// The operand is a forward delta from the end of the instruction.
    JumpRelative,
    /// Plain numeric operand (counts, flags, closure slots).
    Plain,
}

/// Identifies the operation a bytecode instruction performs.
///
/// `#[repr(u8)]` pins each variant to its CPython 2.7 byte value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    StopCode = 0,
    PopTop = 1,
    RotTwo = 2,
    RotThree = 3,
    DupTop = 4,
    RotFour = 5,
    Nop = 9,

    UnaryPositive = 10,
    UnaryNegative = 11,
    UnaryNot = 12,
    UnaryConvert = 13,
    UnaryInvert = 15,

    BinaryPower = 19,
    BinaryMultiply = 20,
    BinaryDivide = 21,
    BinaryModulo = 22,
    BinaryAdd = 23,
    BinarySubtract = 24,
    BinarySubscr = 25,
    BinaryFloorDivide = 26,
    BinaryTrueDivide = 27,
    InplaceFloorDivide = 28,
    InplaceTrueDivide = 29,

    Slice0 = 30,
    Slice1 = 31,
    Slice2 = 32,
    Slice3 = 33,
    StoreSlice0 = 40,
    StoreSlice1 = 41,
    StoreSlice2 = 42,
    StoreSlice3 = 43,
    DeleteSlice0 = 50,
    DeleteSlice1 = 51,
    DeleteSlice2 = 52,
    DeleteSlice3 = 53,

    StoreMap = 54,
    InplaceAdd = 55,
    InplaceSubtract = 56,
    InplaceMultiply = 57,
    InplaceDivide = 58,
    InplaceModulo = 59,
    StoreSubscr = 60,
    DeleteSubscr = 61,
    BinaryLshift = 62,
    BinaryRshift = 63,
    BinaryAnd = 64,
    BinaryXor = 65,
    BinaryOr = 66,
    InplacePower = 67,
    GetIter = 68,

    PrintExpr = 70,
    PrintItem = 71,
    PrintNewline = 72,
    PrintItemTo = 73,
    PrintNewlineTo = 74,
    InplaceLshift = 75,
    InplaceRshift = 76,
    InplaceAnd = 77,
    InplaceXor = 78,
    InplaceOr = 79,

    BreakLoop = 80,
    WithCleanup = 81,
    LoadLocals = 82,
    ReturnValue = 83,
    ImportStar = 84,
    ExecStmt = 85,
    YieldValue = 86,
    PopBlock = 87,
    EndFinally = 88,
    BuildClass = 89,

    // Everything from here on carries a 16-bit operand.
    StoreName = 90,
    DeleteName = 91,
    UnpackSequence = 92,
    ForIter = 93,
    ListAppend = 94,
    StoreAttr = 95,
    DeleteAttr = 96,
    StoreGlobal = 97,
    DeleteGlobal = 98,
    DupTopx = 99,
    LoadConst = 100,
    LoadName = 101,
    BuildTuple = 102,
    BuildList = 103,
    BuildSet = 104,
    BuildMap = 105,
    LoadAttr = 106,
    CompareOp = 107,
    ImportName = 108,
    ImportFrom = 109,
    JumpForward = 110,
    JumpIfFalseOrPop = 111,
    JumpIfTrueOrPop = 112,
    JumpAbsolute = 113,
    PopJumpIfFalse = 114,
    PopJumpIfTrue = 115,
    LoadGlobal = 116,
    ContinueLoop = 119,
    SetupLoop = 120,
    SetupExcept = 121,
    SetupFinally = 122,
    LoadFast = 124,
    StoreFast = 125,
    DeleteFast = 126,
    RaiseVarargs = 130,
    CallFunction = 131,
    MakeFunction = 132,
    BuildSlice = 133,
    MakeClosure = 134,
    LoadClosure = 135,
    LoadDeref = 136,
    StoreDeref = 137,
    CallFunctionVar = 140,
    CallFunctionKw = 141,
    CallFunctionVarKw = 142,
    SetupWith = 143,
    ExtendedArg = 145,
    SetAdd = 146,
    MapAdd = 147,
}

/// All valid opcodes, in byte-value order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 119] = [
    Opcode::StopCode,
    Opcode::PopTop,
    Opcode::RotTwo,
    Opcode::RotThree,
    Opcode::DupTop,
    Opcode::RotFour,
    Opcode::Nop,
    Opcode::UnaryPositive,
    Opcode::UnaryNegative,
    Opcode::UnaryNot,
    Opcode::UnaryConvert,
    Opcode::UnaryInvert,
    Opcode::BinaryPower,
    Opcode::BinaryMultiply,
    Opcode::BinaryDivide,
    Opcode::BinaryModulo,
    Opcode::BinaryAdd,
    Opcode::BinarySubtract,
    Opcode::BinarySubscr,
    Opcode::BinaryFloorDivide,
    Opcode::BinaryTrueDivide,
    Opcode::InplaceFloorDivide,
    Opcode::InplaceTrueDivide,
    Opcode::Slice0,
    Opcode::Slice1,
    Opcode::Slice2,
    Opcode::Slice3,
    Opcode::StoreSlice0,
    Opcode::StoreSlice1,
    Opcode::StoreSlice2,
    Opcode::StoreSlice3,
    Opcode::DeleteSlice0,
    Opcode::DeleteSlice1,
    Opcode::DeleteSlice2,
    Opcode::DeleteSlice3,
    Opcode::StoreMap,
    Opcode::InplaceAdd,
    Opcode::InplaceSubtract,
    Opcode::InplaceMultiply,
    Opcode::InplaceDivide,
    Opcode::InplaceModulo,
    Opcode::StoreSubscr,
    Opcode::DeleteSubscr,
    Opcode::BinaryLshift,
    Opcode::BinaryRshift,
    Opcode::BinaryAnd,
    Opcode::BinaryXor,
    Opcode::BinaryOr,
    Opcode::InplacePower,
    Opcode::GetIter,
    Opcode::PrintExpr,
    Opcode::PrintItem,
    Opcode::PrintNewline,
    Opcode::PrintItemTo,
    Opcode::PrintNewlineTo,
    Opcode::InplaceLshift,
    Opcode::InplaceRshift,
    Opcode::InplaceAnd,
    Opcode::InplaceXor,
    Opcode::InplaceOr,
    Opcode::BreakLoop,
    Opcode::WithCleanup,
    Opcode::LoadLocals,
    Opcode::ReturnValue,
    Opcode::ImportStar,
    Opcode::ExecStmt,
    Opcode::YieldValue,
    Opcode::PopBlock,
    Opcode::EndFinally,
    Opcode::BuildClass,
    Opcode::StoreName,
    Opcode::DeleteName,
    Opcode::UnpackSequence,
    Opcode::ForIter,
    Opcode::ListAppend,
    Opcode::StoreAttr,
    Opcode::DeleteAttr,
    Opcode::StoreGlobal,
    Opcode::DeleteGlobal,
    Opcode::DupTopx,
    Opcode::LoadConst,
    Opcode::LoadName,
    Opcode::BuildTuple,
    Opcode::BuildList,
    Opcode::BuildSet,
    Opcode::BuildMap,
    Opcode::LoadAttr,
    Opcode::CompareOp,
    Opcode::ImportName,
    Opcode::ImportFrom,
    Opcode::JumpForward,
    Opcode::JumpIfFalseOrPop,
    Opcode::JumpIfTrueOrPop,
    Opcode::JumpAbsolute,
    Opcode::PopJumpIfFalse,
    Opcode::PopJumpIfTrue,
    Opcode::LoadGlobal,
    Opcode::ContinueLoop,
    Opcode::SetupLoop,
    Opcode::SetupExcept,
    Opcode::SetupFinally,
    Opcode::LoadFast,
    Opcode::StoreFast,
    Opcode::DeleteFast,
    Opcode::RaiseVarargs,
    Opcode::CallFunction,
    Opcode::MakeFunction,
    Opcode::BuildSlice,
    Opcode::MakeClosure,
    Opcode::LoadClosure,
    Opcode::LoadDeref,
    Opcode::StoreDeref,
    Opcode::CallFunctionVar,
    Opcode::CallFunctionKw,
    Opcode::CallFunctionVarKw,
    Opcode::SetupWith,
    Opcode::ExtendedArg,
    Opcode::SetAdd,
    Opcode::MapAdd,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Opcode::StopCode),
            1 => Ok(Opcode::PopTop),
            2 => Ok(Opcode::RotTwo),
            3 => Ok(Opcode::RotThree),
            4 => Ok(Opcode::DupTop),
            5 => Ok(Opcode::RotFour),
            9 => Ok(Opcode::Nop),
            10 => Ok(Opcode::UnaryPositive),
            11 => Ok(Opcode::UnaryNegative),
            12 => Ok(Opcode::UnaryNot),
            13 => Ok(Opcode::UnaryConvert),
            15 => Ok(Opcode::UnaryInvert),
            19 => Ok(Opcode::BinaryPower),
            20 => Ok(Opcode::BinaryMultiply),
            21 => Ok(Opcode::BinaryDivide),
            22 => Ok(Opcode::BinaryModulo),
            23 => Ok(Opcode::BinaryAdd),
            24 => Ok(Opcode::BinarySubtract),
            25 => Ok(Opcode::BinarySubscr),
            26 => Ok(Opcode::BinaryFloorDivide),
            27 => Ok(Opcode::BinaryTrueDivide),
            28 => Ok(Opcode::InplaceFloorDivide),
            29 => Ok(Opcode::InplaceTrueDivide),
            30 => Ok(Opcode::Slice0),
            31 => Ok(Opcode::Slice1),
            32 => Ok(Opcode::Slice2),
            33 => Ok(Opcode::Slice3),
            40 => Ok(Opcode::StoreSlice0),
            41 => Ok(Opcode::StoreSlice1),
            42 => Ok(Opcode::StoreSlice2),
            43 => Ok(Opcode::StoreSlice3),
            50 => Ok(Opcode::DeleteSlice0),
            51 => Ok(Opcode::DeleteSlice1),
            52 => Ok(Opcode::DeleteSlice2),
            53 => Ok(Opcode::DeleteSlice3),
            54 => Ok(Opcode::StoreMap),
            55 => Ok(Opcode::InplaceAdd),
            56 => Ok(Opcode::InplaceSubtract),
            57 => Ok(Opcode::InplaceMultiply),
            58 => Ok(Opcode::InplaceDivide),
            59 => Ok(Opcode::InplaceModulo),
            60 => Ok(Opcode::StoreSubscr),
            61 => Ok(Opcode::DeleteSubscr),
            62 => Ok(Opcode::BinaryLshift),
            63 => Ok(Opcode::BinaryRshift),
            64 => Ok(Opcode::BinaryAnd),
            65 => Ok(Opcode::BinaryXor),
            66 => Ok(Opcode::BinaryOr),
            67 => Ok(Opcode::InplacePower),
            68 => Ok(Opcode::GetIter),
            70 => Ok(Opcode::PrintExpr),
            71 => Ok(Opcode::PrintItem),
            72 => Ok(Opcode::PrintNewline),
            73 => Ok(Opcode::PrintItemTo),
            74 => Ok(Opcode::PrintNewlineTo),
            75 => Ok(Opcode::InplaceLshift),
            76 => Ok(Opcode::InplaceRshift),
            77 => Ok(Opcode::InplaceAnd),
            78 => Ok(Opcode::InplaceXor),
            79 => Ok(Opcode::InplaceOr),
            80 => Ok(Opcode::BreakLoop),
            81 => Ok(Opcode::WithCleanup),
            82 => Ok(Opcode::LoadLocals),
            83 => Ok(Opcode::ReturnValue),
            84 => Ok(Opcode::ImportStar),
            85 => Ok(Opcode::ExecStmt),
            86 => Ok(Opcode::YieldValue),
            87 => Ok(Opcode::PopBlock),
            88 => Ok(Opcode::EndFinally),
            89 => Ok(Opcode::BuildClass),
            90 => Ok(Opcode::StoreName),
            91 => Ok(Opcode::DeleteName),
            92 => Ok(Opcode::UnpackSequence),
            93 => Ok(Opcode::ForIter),
            94 => Ok(Opcode::ListAppend),
            95 => Ok(Opcode::StoreAttr),
            96 => Ok(Opcode::DeleteAttr),
            97 => Ok(Opcode::StoreGlobal),
            98 => Ok(Opcode::DeleteGlobal),
            99 => Ok(Opcode::DupTopx),
            100 => Ok(Opcode::LoadConst),
            101 => Ok(Opcode::LoadName),
            102 => Ok(Opcode::BuildTuple),
            103 => Ok(Opcode::BuildList),
            104 => Ok(Opcode::BuildSet),
            105 => Ok(Opcode::BuildMap),
            106 => Ok(Opcode::LoadAttr),
            107 => Ok(Opcode::CompareOp),
            108 => Ok(Opcode::ImportName),
            109 => Ok(Opcode::ImportFrom),
            110 => Ok(Opcode::JumpForward),
            111 => Ok(Opcode::JumpIfFalseOrPop),
            112 => Ok(Opcode::JumpIfTrueOrPop),
            113 => Ok(Opcode::JumpAbsolute),
            114 => Ok(Opcode::PopJumpIfFalse),
            115 => Ok(Opcode::PopJumpIfTrue),
            116 => Ok(Opcode::LoadGlobal),
            119 => Ok(Opcode::ContinueLoop),
            120 => Ok(Opcode::SetupLoop),
            121 => Ok(Opcode::SetupExcept),
            122 => Ok(Opcode::SetupFinally),
            124 => Ok(Opcode::LoadFast),
            125 => Ok(Opcode::StoreFast),
            126 => Ok(Opcode::DeleteFast),
            130 => Ok(Opcode::RaiseVarargs),
            131 => Ok(Opcode::CallFunction),
            132 => Ok(Opcode::MakeFunction),
            133 => Ok(Opcode::BuildSlice),
            134 => Ok(Opcode::MakeClosure),
            135 => Ok(Opcode::LoadClosure),
            136 => Ok(Opcode::LoadDeref),
            137 => Ok(Opcode::StoreDeref),
            140 => Ok(Opcode::CallFunctionVar),
            141 => Ok(Opcode::CallFunctionKw),
            142 => Ok(Opcode::CallFunctionVarKw),
            143 => Ok(Opcode::SetupWith),
            145 => Ok(Opcode::ExtendedArg),
            146 => Ok(Opcode::SetAdd),
            147 => Ok(Opcode::MapAdd),

            // Bytes the 2.7 compiler never assigns: 6-8, 14, 16-18, 34-39,
            // 44-49, 69, 117-118, 123, 127-129, 138-139, 144, 148-255.
            other => Err(DecodeError::UnknownOpcode(other)),
        }
    }
}

impl Opcode {
    /// Returns the `dis.opname` mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::StopCode => "STOP_CODE",
            Opcode::PopTop => "POP_TOP",
            Opcode::RotTwo => "ROT_TWO",
            Opcode::RotThree => "ROT_THREE",
            Opcode::DupTop => "DUP_TOP",
            Opcode::RotFour => "ROT_FOUR",
            Opcode::Nop => "NOP",
            Opcode::UnaryPositive => "UNARY_POSITIVE",
            Opcode::UnaryNegative => "UNARY_NEGATIVE",
            Opcode::UnaryNot => "UNARY_NOT",
            Opcode::UnaryConvert => "UNARY_CONVERT",
            Opcode::UnaryInvert => "UNARY_INVERT",
            Opcode::BinaryPower => "BINARY_POWER",
            Opcode::BinaryMultiply => "BINARY_MULTIPLY",
            Opcode::BinaryDivide => "BINARY_DIVIDE",
            Opcode::BinaryModulo => "BINARY_MODULO",
            Opcode::BinaryAdd => "BINARY_ADD",
            Opcode::BinarySubtract => "BINARY_SUBTRACT",
            Opcode::BinarySubscr => "BINARY_SUBSCR",
            Opcode::BinaryFloorDivide => "BINARY_FLOOR_DIVIDE",
            Opcode::BinaryTrueDivide => "BINARY_TRUE_DIVIDE",
            Opcode::InplaceFloorDivide => "INPLACE_FLOOR_DIVIDE",
            Opcode::InplaceTrueDivide => "INPLACE_TRUE_DIVIDE",
            Opcode::Slice0 => "SLICE+0",
            Opcode::Slice1 => "SLICE+1",
            Opcode::Slice2 => "SLICE+2",
            Opcode::Slice3 => "SLICE+3",
            Opcode::StoreSlice0 => "STORE_SLICE+0",
            Opcode::StoreSlice1 => "STORE_SLICE+1",
            Opcode::StoreSlice2 => "STORE_SLICE+2",
            Opcode::StoreSlice3 => "STORE_SLICE+3",
            Opcode::DeleteSlice0 => "DELETE_SLICE+0",
            Opcode::DeleteSlice1 => "DELETE_SLICE+1",
            Opcode::DeleteSlice2 => "DELETE_SLICE+2",
            Opcode::DeleteSlice3 => "DELETE_SLICE+3",
            Opcode::StoreMap => "STORE_MAP",
            Opcode::InplaceAdd => "INPLACE_ADD",
            Opcode::InplaceSubtract => "INPLACE_SUBTRACT",
            Opcode::InplaceMultiply => "INPLACE_MULTIPLY",
            Opcode::InplaceDivide => "INPLACE_DIVIDE",
            Opcode::InplaceModulo => "INPLACE_MODULO",
            Opcode::StoreSubscr => "STORE_SUBSCR",
            Opcode::DeleteSubscr => "DELETE_SUBSCR",
            Opcode::BinaryLshift => "BINARY_LSHIFT",
            Opcode::BinaryRshift => "BINARY_RSHIFT",
            Opcode::BinaryAnd => "BINARY_AND",
            Opcode::BinaryXor => "BINARY_XOR",
            Opcode::BinaryOr => "BINARY_OR",
            Opcode::InplacePower => "INPLACE_POWER",
            Opcode::GetIter => "GET_ITER",
            Opcode::PrintExpr => "PRINT_EXPR",
            Opcode::PrintItem => "PRINT_ITEM",
            Opcode::PrintNewline => "PRINT_NEWLINE",
            Opcode::PrintItemTo => "PRINT_ITEM_TO",
            Opcode::PrintNewlineTo => "PRINT_NEWLINE_TO",
            Opcode::InplaceLshift => "INPLACE_LSHIFT",
            Opcode::InplaceRshift => "INPLACE_RSHIFT",
            Opcode::InplaceAnd => "INPLACE_AND",
            Opcode::InplaceXor => "INPLACE_XOR",
            Opcode::InplaceOr => "INPLACE_OR",
            Opcode::BreakLoop => "BREAK_LOOP",
            Opcode::WithCleanup => "WITH_CLEANUP",
            Opcode::LoadLocals => "LOAD_LOCALS",
            Opcode::ReturnValue => "RETURN_VALUE",
            Opcode::ImportStar => "IMPORT_STAR",
            Opcode::ExecStmt => "EXEC_STMT",
            Opcode::YieldValue => "YIELD_VALUE",
            Opcode::PopBlock => "POP_BLOCK",
            Opcode::EndFinally => "END_FINALLY",
            Opcode::BuildClass => "BUILD_CLASS",
            Opcode::StoreName => "STORE_NAME",
            Opcode::DeleteName => "DELETE_NAME",
            Opcode::UnpackSequence => "UNPACK_SEQUENCE",
            Opcode::ForIter => "FOR_ITER",
            Opcode::ListAppend => "LIST_APPEND",
            Opcode::StoreAttr => "STORE_ATTR",
            Opcode::DeleteAttr => "DELETE_ATTR",
            Opcode::StoreGlobal => "STORE_GLOBAL",
            Opcode::DeleteGlobal => "DELETE_GLOBAL",
            Opcode::DupTopx => "DUP_TOPX",
            Opcode::LoadConst => "LOAD_CONST",
            Opcode::LoadName => "LOAD_NAME",
            Opcode::BuildTuple => "BUILD_TUPLE",
            Opcode::BuildList => "BUILD_LIST",
            Opcode::BuildSet => "BUILD_SET",
            Opcode::BuildMap => "BUILD_MAP",
            Opcode::LoadAttr => "LOAD_ATTR",
            Opcode::CompareOp => "COMPARE_OP",
            Opcode::ImportName => "IMPORT_NAME",
            Opcode::ImportFrom => "IMPORT_FROM",
            Opcode::JumpForward => "JUMP_FORWARD",
            Opcode::JumpIfFalseOrPop => "JUMP_IF_FALSE_OR_POP",
            Opcode::JumpIfTrueOrPop => "JUMP_IF_TRUE_OR_POP",
            Opcode::JumpAbsolute => "JUMP_ABSOLUTE",
            Opcode::PopJumpIfFalse => "POP_JUMP_IF_FALSE",
            Opcode::PopJumpIfTrue => "POP_JUMP_IF_TRUE",
            Opcode::LoadGlobal => "LOAD_GLOBAL",
            Opcode::ContinueLoop => "CONTINUE_LOOP",
            Opcode::SetupLoop => "SETUP_LOOP",
            Opcode::SetupExcept => "SETUP_EXCEPT",
            Opcode::SetupFinally => "SETUP_FINALLY",
            Opcode::LoadFast => "LOAD_FAST",
            Opcode::StoreFast => "STORE_FAST",
            Opcode::DeleteFast => "DELETE_FAST",
            Opcode::RaiseVarargs => "RAISE_VARARGS",
            Opcode::CallFunction => "CALL_FUNCTION",
            Opcode::MakeFunction => "MAKE_FUNCTION",
            Opcode::BuildSlice => "BUILD_SLICE",
            Opcode::MakeClosure => "MAKE_CLOSURE",
            Opcode::LoadClosure => "LOAD_CLOSURE",
            Opcode::LoadDeref => "LOAD_DEREF",
            Opcode::StoreDeref => "STORE_DEREF",
            Opcode::CallFunctionVar => "CALL_FUNCTION_VAR",
            Opcode::CallFunctionKw => "CALL_FUNCTION_KW",
            Opcode::CallFunctionVarKw => "CALL_FUNCTION_VAR_KW",
            Opcode::SetupWith => "SETUP_WITH",
            Opcode::ExtendedArg => "EXTENDED_ARG",
            Opcode::SetAdd => "SET_ADD",
            Opcode::MapAdd => "MAP_ADD",
        }
    }

    /// True if this opcode is followed by a 16-bit operand.
    pub fn has_operand(&self) -> bool {
        (*self as u8) >= HAVE_ARGUMENT
    }

    /// The resolution class of this opcode's operand.
    ///
    /// Meaningless (but still defined, as [`OperandKind::Plain`]) for
    /// opcodes below [`HAVE_ARGUMENT`].
    pub fn operand_kind(&self) -> OperandKind {
        match self {
            Opcode::LoadConst => OperandKind::Constant,

            Opcode::StoreName
            | Opcode::DeleteName
            | Opcode::StoreAttr
            | Opcode::DeleteAttr
            | Opcode::StoreGlobal
            | Opcode::DeleteGlobal
            | Opcode::LoadName
            | Opcode::LoadAttr
            | Opcode::ImportName
            | Opcode::ImportFrom
            | Opcode::LoadGlobal => OperandKind::NameRef,

            Opcode::LoadFast | Opcode::StoreFast | Opcode::DeleteFast => OperandKind::Local,

            Opcode::CompareOp => OperandKind::Compare,

            Opcode::JumpIfFalseOrPop
            | Opcode::JumpIfTrueOrPop
            | Opcode::JumpAbsolute
            | Opcode::PopJumpIfFalse
            | Opcode::PopJumpIfTrue
            | Opcode::ContinueLoop => OperandKind::JumpAbsolute,

            Opcode::ForIter
            | Opcode::JumpForward
            | Opcode::SetupLoop
            | Opcode::SetupExcept
            | Opcode::SetupFinally
            | Opcode::SetupWith => OperandKind::JumpRelative,

            _ => OperandKind::Plain,
        }
    }
}
