//! Translation command codes.
//!
//! The numeric values are an external contract shared with the proxy and
//! must never be renumbered. New commands are only ever appended.

macro_rules! commands {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// A known translation protocol command.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Command {
            $($(#[$meta])* $name = $value,)*
        }

        impl Command {
            /// Look up a command by its wire code.
            ///
            /// Returns `None` for codes this server does not know about.
            pub fn from_u16(value: u16) -> Option<Self> {
                match value {
                    $($value => Some(Command::$name),)*
                    _ => None,
                }
            }

            /// Command name, used in log output.
            pub fn name(self) -> &'static str {
                match self {
                    $(Command::$name => stringify!($name),)*
                }
            }
        }
    };
}

commands! {
    /// Starts a request or a response.
    Begin = 1,
    /// Terminates a request or a response.
    End = 2,
    Host = 3,
    Uri = 4,
    Status = 5,
    Path = 6,
    ContentType = 7,
    /// HTTP proxy address (historically called PROXY).
    Http = 8,
    Redirect = 9,
    /// Introduces one stage of the filter chain.
    Filter = 10,
    Process = 11,
    Session = 12,
    Param = 13,
    User = 14,
    Language = 15,
    RemoteHost = 16,
    PathInfo = 17,
    Site = 18,
    Cgi = 19,
    DocumentRoot = 20,
    WidgetType = 21,
    Container = 22,
    Address = 23,
    AddressString = 24,
    JailCgi = 26,
    Interpreter = 27,
    Action = 28,
    ScriptName = 29,
    Ajp = 30,
    Domain = 31,
    Stateful = 32,
    FastCgi = 33,
    View = 34,
    UserAgent = 35,
    MaxAge = 36,
    Vary = 37,
    QueryString = 38,
    Pipe = 39,
    Base = 40,
    Delegate = 41,
    Invalidate = 42,
    LocalAddress = 43,
    LocalAddressString = 44,
    Append = 45,
    DiscardSession = 46,
    Scheme = 47,
    RequestHeaderForward = 48,
    ResponseHeaderForward = 49,
    Deflated = 50,
    Gzipped = 51,
    Pair = 52,
    Untrusted = 53,
    Bounce = 54,
    Args = 55,
    WwwAuthenticate = 56,
    AuthenticationInfo = 57,
    Authorization = 58,
    Header = 59,
    UntrustedPrefix = 60,
    SecureCookie = 61,
    Filter4xx = 62,
    ErrorDocument = 63,
    Check = 64,
    Previous = 65,
    Was = 66,
    Home = 67,
    Realm = 68,
    UntrustedSiteSuffix = 69,
    Transparent = 70,
    Sticky = 71,
    DumpHeaders = 72,
    CookieHost = 73,
    ProcessCss = 74,
    PrefixCssClass = 75,
    FocusWidget = 76,
    AnchorAbsolute = 77,
    PrefixXmlId = 78,
    Regex = 79,
    InverseRegex = 80,
    ProcessText = 81,
    WidgetInfo = 82,
    ExpandPathInfo = 83,
    ExpandPath = 84,
    CookieDomain = 85,
    LocalUri = 86,
    AutoBase = 87,
    UaClass = 88,
    ProcessStyle = 89,
    DirectAddressing = 90,
    SelfContainer = 91,
    GroupContainer = 92,
    WidgetGroup = 93,
    ValidateMtime = 94,
    NfsServer = 95,
    NfsExport = 96,
    LhttpPath = 97,
    LhttpUri = 98,
    ExpandLhttpUri = 99,
    LhttpHost = 100,
    Concurrency = 101,
    WantFullUri = 102,
    UserNamespace = 103,
    NetworkNamespace = 104,
    ExpandAppend = 105,
    ExpandPair = 106,
    PidNamespace = 107,
    PivotRoot = 108,
    MountProc = 109,
    MountHome = 110,
    MountTmpTmpfs = 111,
    UtsNamespace = 112,
    BindMount = 113,
    Rlimits = 114,
    Want = 115,
    UnsafeBase = 116,
    EasyBase = 117,
    RegexTail = 118,
    RegexUnescape = 119,
    FileNotFound = 120,
    ContentTypeLookup = 121,
    Suffix = 122,
    DirectoryIndex = 123,
    ExpiresRelative = 124,
    ExpandRedirect = 125,
    ExpandScriptName = 126,
    TestPath = 127,
    ExpandTestPath = 128,
    RedirectQueryString = 129,
}

impl Command {
    /// Wire code of this command.
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl From<Command> for u16 {
    fn from(command: Command) -> u16 {
        command.code()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=200u16 {
            if let Some(command) = Command::from_u16(code) {
                assert_eq!(command.code(), code);
            }
        }
    }

    #[test]
    fn stable_assignments() {
        assert_eq!(Command::Begin.code(), 1);
        assert_eq!(Command::End.code(), 2);
        assert_eq!(Command::Uri.code(), 4);
        assert_eq!(Command::Filter.code(), 10);
        assert_eq!(Command::Want.code(), 115);
        assert_eq!(Command::RedirectQueryString.code(), 129);
    }

    #[test]
    fn unassigned_codes_are_unknown() {
        assert_eq!(Command::from_u16(0), None);
        assert_eq!(Command::from_u16(25), None);
        assert_eq!(Command::from_u16(9999), None);
    }
}
