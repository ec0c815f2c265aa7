//! The closed set of verbs the shell recognizes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Active,
    Add,
    Assign,
    Attach,
    Attributes,
    Automount,
    Break,
    Clean,
    Compact,
    Convert,
    Create,
    Delete,
    Detach,
    Detail,
    Dump,
    Exit,
    Expand,
    Extend,
    Filesystems,
    Format,
    Gpt,
    Help,
    Import,
    Inactive,
    List,
    Merge,
    Offline,
    Online,
    Recover,
    Rem,
    Remove,
    Repair,
    Rescan,
    Retain,
    San,
    Select,
    Set,
    SetId,
    Shrink,
    UniqueId,
}

impl Verb {
    /// Every verb, in help order.
    pub const ALL: [Verb; 40] = [
        Verb::Active,
        Verb::Add,
        Verb::Assign,
        Verb::Attach,
        Verb::Attributes,
        Verb::Automount,
        Verb::Break,
        Verb::Clean,
        Verb::Compact,
        Verb::Convert,
        Verb::Create,
        Verb::Delete,
        Verb::Detach,
        Verb::Detail,
        Verb::Dump,
        Verb::Exit,
        Verb::Expand,
        Verb::Extend,
        Verb::Filesystems,
        Verb::Format,
        Verb::Gpt,
        Verb::Help,
        Verb::Import,
        Verb::Inactive,
        Verb::List,
        Verb::Merge,
        Verb::Offline,
        Verb::Online,
        Verb::Recover,
        Verb::Rem,
        Verb::Remove,
        Verb::Repair,
        Verb::Rescan,
        Verb::Retain,
        Verb::San,
        Verb::Select,
        Verb::Set,
        Verb::SetId,
        Verb::Shrink,
        Verb::UniqueId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Verb::Active => "active",
            Verb::Add => "add",
            Verb::Assign => "assign",
            Verb::Attach => "attach",
            Verb::Attributes => "attributes",
            Verb::Automount => "automount",
            Verb::Break => "break",
            Verb::Clean => "clean",
            Verb::Compact => "compact",
            Verb::Convert => "convert",
            Verb::Create => "create",
            Verb::Delete => "delete",
            Verb::Detach => "detach",
            Verb::Detail => "detail",
            Verb::Dump => "dump",
            Verb::Exit => "exit",
            Verb::Expand => "expand",
            Verb::Extend => "extend",
            Verb::Filesystems => "filesystems",
            Verb::Format => "format",
            Verb::Gpt => "gpt",
            Verb::Help => "help",
            Verb::Import => "import",
            Verb::Inactive => "inactive",
            Verb::List => "list",
            Verb::Merge => "merge",
            Verb::Offline => "offline",
            Verb::Online => "online",
            Verb::Recover => "recover",
            Verb::Rem => "rem",
            Verb::Remove => "remove",
            Verb::Repair => "repair",
            Verb::Rescan => "rescan",
            Verb::Retain => "retain",
            Verb::San => "san",
            Verb::Select => "select",
            Verb::Set => "set",
            Verb::SetId => "setid",
            Verb::Shrink => "shrink",
            Verb::UniqueId => "uniqueid",
        }
    }

    /// Case-insensitive lookup; `?` is an alias of `help`.
    pub fn parse(word: &str) -> Option<Self> {
        if word == "?" {
            return Some(Verb::Help);
        }
        Verb::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(word))
    }

    /// Recognized verbs that are accepted without doing anything.
    pub fn is_implemented(&self) -> bool {
        !matches!(
            self,
            Verb::Automount
                | Verb::Compact
                | Verb::Dump
                | Verb::Import
                | Verb::Merge
                | Verb::Recover
                | Verb::Retain
                | Verb::San
                | Verb::Set
        )
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
