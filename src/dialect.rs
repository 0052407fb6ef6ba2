/// Placeholder style a DBMS expects in statements routed through the IDE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Positional `?` placeholders.
    Qmark,
}

/// Base SQL grammar to hand to a SQL framework layered on this driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Generic,
    Sqlite,
    Postgres,
}

/// Per-DBMS driver capabilities, resolved once at connect time from the
/// `dbms` identifier the IDE reports for the data source.
///
/// Row counts coming back through the bridge are what the IDE observed,
/// not what the underlying JDBC driver guarantees, so both rowcount
/// capability flags stay off across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbmsProfile {
    pub dbms: &'static str,
    pub paramstyle: ParamStyle,
    pub grammar: Grammar,
    pub sane_rowcount: bool,
    pub sane_multi_rowcount: bool,
}

const DEFAULT_PROFILE: DbmsProfile = DbmsProfile {
    dbms: "GENERIC",
    paramstyle: ParamStyle::Qmark,
    grammar: Grammar::Generic,
    sane_rowcount: false,
    sane_multi_rowcount: false,
};

const PROFILES: &[DbmsProfile] = &[
    DbmsProfile {
        dbms: "SQLITE",
        paramstyle: ParamStyle::Qmark,
        grammar: Grammar::Sqlite,
        sane_rowcount: false,
        sane_multi_rowcount: false,
    },
    DbmsProfile {
        dbms: "POSTGRES",
        paramstyle: ParamStyle::Qmark,
        grammar: Grammar::Postgres,
        sane_rowcount: false,
        sane_multi_rowcount: false,
    },
];

impl DbmsProfile {
    /// Look up the profile for a reported DBMS identifier; unknown
    /// identifiers get the generic profile.
    pub fn resolve(dbms: &str) -> &'static DbmsProfile {
        let dbms = dbms.to_uppercase();
        PROFILES
            .iter()
            .find(|p| p.dbms == dbms)
            .unwrap_or(&DEFAULT_PROFILE)
    }
}
