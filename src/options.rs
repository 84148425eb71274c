/// Identifies what a command line option does, independent of its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionId {
    Fullscreen,
    Scale,
    Background,
    Geometry,
    Info,
    Class,
    NoSway,
    Version,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Required,
}

#[derive(Debug)]
pub struct OptionSpec {
    pub id: OptionId,
    pub long: &'static str,
    pub short: Option<char>,
    pub arity: Arity,
    /// Placeholder shown in usage text for options taking a value.
    pub value_name: &'static str,
    pub help: &'static str,
}

impl OptionSpec {
    const fn flag(id: OptionId, long: &'static str, short: char, help: &'static str) -> Self {
        Self {
            id,
            long,
            short: Some(short),
            arity: Arity::None,
            value_name: "",
            help,
        }
    }

    const fn value(
        id: OptionId,
        long: &'static str,
        short: char,
        value_name: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            id,
            long,
            short: Some(short),
            arity: Arity::Required,
            value_name,
            help,
        }
    }
}

/// Command line options, in the order they are listed in the usage text.
pub static OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag(OptionId::Fullscreen, "fullscreen", 'f', "Full screen mode"),
    OptionSpec::value(
        OptionId::Scale,
        "scale",
        's',
        "TYPE",
        "Set initial image scale: default, fit, or real",
    ),
    OptionSpec::value(
        OptionId::Background,
        "background",
        'b',
        "XXXXXX",
        "Set background color as hex RGB",
    ),
    OptionSpec::value(
        OptionId::Geometry,
        "geometry",
        'g',
        "X,Y,W,H",
        "Set window geometry",
    ),
    OptionSpec::flag(OptionId::Info, "info", 'i', "Show image properties"),
    OptionSpec::value(OptionId::Class, "class", 'c', "NAME", "Set window class/app_id"),
    OptionSpec::flag(OptionId::NoSway, "no-sway", 'n', "Disable integration with Sway WM"),
    OptionSpec::flag(OptionId::Version, "version", 'v', "Print version info and exit"),
    OptionSpec::flag(OptionId::Help, "help", 'h', "Print this help and exit"),
];

/// getopt-style short option string derived from an option table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortSpec(String);

impl ShortSpec {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Arity of a short option, or `None` if the character is not an option.
    pub fn arity_of(&self, c: char) -> Option<Arity> {
        if c == ':' {
            return None;
        }
        let mut chars = self.0.chars().peekable();
        while let Some(opt) = chars.next() {
            let required = chars.next_if_eq(&':').is_some();
            if opt == c {
                return Some(if required { Arity::Required } else { Arity::None });
            }
        }
        None
    }
}

/// Builds the short option string: each short character, followed by a
/// colon when the option requires a value.
pub fn short_spec(table: &[OptionSpec]) -> ShortSpec {
    let mut spec = String::with_capacity(table.len() * 2);
    for opt in table {
        if let Some(c) = opt.short {
            spec.push(c);
            if opt.arity == Arity::Required {
                spec.push(':');
            }
        }
    }
    ShortSpec(spec)
}

pub fn find_short(table: &'static [OptionSpec], c: char) -> Option<&'static OptionSpec> {
    table.iter().find(|opt| opt.short == Some(c))
}

/// Result of looking up a (possibly abbreviated) long option name.
#[derive(Debug)]
pub enum LongMatch {
    Found(&'static OptionSpec),
    Ambiguous,
    Unknown,
}

/// Exact names win; otherwise a prefix matching exactly one option is accepted.
pub fn find_long(table: &'static [OptionSpec], name: &str) -> LongMatch {
    if name.is_empty() {
        return LongMatch::Unknown;
    }
    if let Some(opt) = table.iter().find(|opt| opt.long == name) {
        return LongMatch::Found(opt);
    }
    let mut candidates = table.iter().filter(|opt| opt.long.starts_with(name));
    match (candidates.next(), candidates.next()) {
        (Some(opt), None) => LongMatch::Found(opt),
        (Some(_), Some(_)) => LongMatch::Ambiguous,
        _ => LongMatch::Unknown,
    }
}

/// Usage text rendered from the option table.
pub fn usage(app_name: &str, table: &[OptionSpec]) -> String {
    let mut text = format!("Usage: {app_name} [OPTION...] [FILE...]\n");
    for opt in table {
        let short = match opt.short {
            Some(c) => format!("-{c}, "),
            None => "    ".to_string(),
        };
        let long = match opt.arity {
            Arity::None => format!("--{}", opt.long),
            Arity::Required => format!("--{}={}", opt.long, opt.value_name),
        };
        text.push_str(&format!("  {short}{long:<21}{}\n", opt.help));
    }
    text
}
