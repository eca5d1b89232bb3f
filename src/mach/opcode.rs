/// ## Virtual machine instruction set
///
/// The machine has no registers. Operands come from the byte stream after
/// the opcode or from the operand stack, and results go back on the stack.
///
/// For example, `a = b + 3` with `a` and `b` as globals compiles to
/// `[PushChar(0), RefInt(a), LoadInt(b), AddImm(3), Store, Pop]`.
///
/// Bytes `0x00..=0x51` are the core instructions. Bytes from `0x80` are
/// system calls into the runtime library and the peripherals.

macro_rules! opcodes {
    ($($(#[$doc:meta])* $name:ident = $byte:literal => $text:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Opcode {
            $($(#[$doc])* $name = $byte,)*
        }

        impl Opcode {
            pub fn from_byte(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $text,)*
                }
            }
        }
    };
}

opcodes! {
    // *** Literals and loads
    Nop = 0x00 => "NOP",
    PushChar = 0x01 => "PUSHCHAR",
    PushInt = 0x02 => "PUSHINT",
    PushLong = 0x03 => "PUSHLONG",
    LoadChar = 0x04 => "LOADCHAR",
    LoadInt = 0x05 => "LOADINT",
    LoadLong = 0x06 => "LOADLONG",
    IndexChar = 0x07 => "INDEXCHAR",
    IndexInt = 0x08 => "INDEXINT",
    IndexLong = 0x09 => "INDEXLONG",
    RefChar = 0x0a => "REFCHAR",
    RefInt = 0x0b => "REFINT",
    RefLong = 0x0c => "REFLONG",
    /// Intern the literal that follows and push its tagged address.
    Intern = 0x0d => "INTERN",
    LocalChar = 0x0e => "LOCALCHAR",
    LocalInt = 0x0f => "LOCALINT",
    LocalLong = 0x10 => "LOCALLONG",
    LocalIndexChar = 0x11 => "LOCALINDEXCHAR",
    LocalIndexInt = 0x12 => "LOCALINDEXINT",
    LocalIndexLong = 0x13 => "LOCALINDEXLONG",
    LocalRefChar = 0x14 => "LOCALREFCHAR",
    LocalRefInt = 0x15 => "LOCALREFINT",
    LocalRefLong = 0x16 => "LOCALREFLONG",
    Addr = 0x17 => "ADDR",
    LocalIndexAddr = 0x18 => "LOCALINDEXADDR",
    LocalAddr = 0x19 => "LOCALADDR",
    TextBase = 0x1a => "TEXTBASE",
    GraphBase = 0x1b => "GRAPHBASE",

    // *** Expression operations
    Neg = 0x1c => "NEG",
    PreInc = 0x1d => "PREINC",
    PreDec = 0x1e => "PREDEC",
    PostInc = 0x1f => "POSTINC",
    PostDec = 0x20 => "POSTDEC",
    Add = 0x21 => "ADD",
    Sub = 0x22 => "SUB",
    BitAnd = 0x23 => "BITAND",
    BitOr = 0x24 => "BITOR",
    BitNot = 0x25 => "BITNOT",
    BitXor = 0x26 => "BITXOR",
    And = 0x27 => "AND",
    Or = 0x28 => "OR",
    Not = 0x29 => "NOT",
    Mul = 0x2a => "MUL",
    Div = 0x2b => "DIV",
    Mod = 0x2c => "MOD",
    Shl = 0x2d => "SHL",
    Shr = 0x2e => "SHR",
    Eq = 0x2f => "EQ",
    NotEq = 0x30 => "NOTEQ",
    LtEq = 0x31 => "LTEQ",
    GtEq = 0x32 => "GTEQ",
    Gt = 0x33 => "GT",
    Lt = 0x34 => "LT",
    /// Pop value and reference, write through the reference, push value.
    Store = 0x35 => "STORE",
    Deref = 0x36 => "DEREF",
    MakeRef = 0x37 => "MAKEREF",
    Pop = 0x38 => "POP",

    // *** Branch control
    /// Branch if the top of stack is zero. The value stays on the stack.
    JumpZero = 0x39 => "JZ",
    /// Branch if the top of stack is not zero. The value stays on the stack.
    JumpNotZero = 0x3a => "JNZ",
    Jump = 0x3b => "JMP",
    /// Set both region bounds; the outermost frame.
    Mark = 0x3c => "MARK",
    Invoke = 0x3d => "INVOKE",
    /// First instruction of every function.
    Entry = 0x3e => "ENTRY",
    Return = 0x3f => "RETURN",
    End = 0x40 => "END",
    DataInit = 0x41 => "DATAINIT",
    BufferBase = 0x42 => "BUFFERBASE",
    Invalid = 0x43 => "INVALID",
    LoadAll = 0x44 => "LOADALL",

    // *** Operations against a 16-bit immediate
    AddImm = 0x45 => "ADDIMM",
    SubImm = 0x46 => "SUBIMM",
    MulImm = 0x47 => "MULIMM",
    DivImm = 0x48 => "DIVIMM",
    ModImm = 0x49 => "MODIMM",
    ShlImm = 0x4a => "SHLIMM",
    /// Logical (unsigned) right shift.
    ShrImm = 0x4b => "SHRIMM",
    EqImm = 0x4c => "EQIMM",
    NotEqImm = 0x4d => "NOTEQIMM",
    GtImm = 0x4e => "GTIMM",
    LtImm = 0x4f => "LTIMM",
    GtEqImm = 0x50 => "GTEQIMM",
    LtEqImm = 0x51 => "LTEQIMM",

    // *** System calls
    PutChar = 0x80 => "PUTCHAR",
    GetChar = 0x81 => "GETCHAR",
    Printf = 0x82 => "PRINTF",
    StrCpy = 0x83 => "STRCPY",
    StrLen = 0x84 => "STRLEN",
    SetScreen = 0x85 => "SETSCREEN",
    UpdateLcd = 0x86 => "UPDATELCD",
    Delay = 0x87 => "DELAY",
    WriteBlock = 0x88 => "WRITEBLOCK",
    Refresh = 0x89 => "REFRESH",
    TextOut = 0x8a => "TEXTOUT",
    Block = 0x8b => "BLOCK",
    Rectangle = 0x8c => "RECTANGLE",
    Exit = 0x8d => "EXIT",
    ClearScreen = 0x8e => "CLEARSCREEN",
    Abs = 0x8f => "ABS",
    Rand = 0x90 => "RAND",
    Srand = 0x91 => "SRAND",
    Locate = 0x92 => "LOCATE",
    Inkey = 0x93 => "INKEY",
    Point = 0x94 => "POINT",
    GetPoint = 0x95 => "GETPOINT",
    Line = 0x96 => "LINE",
    Box = 0x97 => "BOX",
    Circle = 0x98 => "CIRCLE",
    Ellipse = 0x99 => "ELLIPSE",
    Beep = 0x9a => "BEEP",
    IsAlnum = 0x9b => "ISALNUM",
    IsAlpha = 0x9c => "ISALPHA",
    IsCntrl = 0x9d => "ISCNTRL",
    IsDigit = 0x9e => "ISDIGIT",
    IsGraph = 0x9f => "ISGRAPH",
    IsLower = 0xa0 => "ISLOWER",
    IsPrint = 0xa1 => "ISPRINT",
    IsPunct = 0xa2 => "ISPUNCT",
    IsSpace = 0xa3 => "ISSPACE",
    IsUpper = 0xa4 => "ISUPPER",
    IsXDigit = 0xa5 => "ISXDIGIT",
    StrCat = 0xa6 => "STRCAT",
    StrChr = 0xa7 => "STRCHR",
    StrCmp = 0xa8 => "STRCMP",
    StrStr = 0xa9 => "STRSTR",
    ToLower = 0xaa => "TOLOWER",
    ToUpper = 0xab => "TOUPPER",
    MemSet = 0xac => "MEMSET",
    MemCpy = 0xad => "MEMCPY",
    FOpen = 0xae => "FOPEN",
    FClose = 0xaf => "FCLOSE",
    FRead = 0xb0 => "FREAD",
    FWrite = 0xb1 => "FWRITE",
    FSeek = 0xb2 => "FSEEK",
    FTell = 0xb3 => "FTELL",
    FEof = 0xb4 => "FEOF",
    Rewind = 0xb5 => "REWIND",
    GetC = 0xb6 => "GETC",
    PutC = 0xb7 => "PUTC",
    Sprintf = 0xb8 => "SPRINTF",
    MakeDir = 0xb9 => "MAKEDIR",
    DeleteFile = 0xba => "DELETEFILE",
    GetMs = 0xbb => "GETMS",
    CheckKey = 0xbc => "CHECKKEY",
    MemMove = 0xbd => "MEMMOVE",
    Crc16 = 0xbe => "CRC16",
    Secret = 0xbf => "SECRET",
    ChDir = 0xc0 => "CHDIR",
    FileList = 0xc1 => "FILELIST",
    GetTime = 0xc2 => "GETTIME",
    SetTime = 0xc3 => "SETTIME",
    GetWord = 0xc4 => "GETWORD",
    XDraw = 0xc5 => "XDRAW",
    ReleaseKey = 0xc6 => "RELEASEKEY",
    GetBlock = 0xc7 => "GETBLOCK",
    Cos = 0xc8 => "COS",
    Sin = 0xc9 => "SIN",
    FillArea = 0xca => "FILLAREA",
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
