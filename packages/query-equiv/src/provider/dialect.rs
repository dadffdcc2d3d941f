use std::{fmt, str::FromStr};

use sqltk::parser::{
    ast::Statement,
    dialect::{
        AnsiDialect, BigQueryDialect, DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect,
        PostgreSqlDialect, SQLiteDialect, SnowflakeDialect,
    },
    parser::{Parser, ParserError},
};

use crate::ParseError;

/// The SQL dialect used to parse query text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    Generic,
    #[default]
    Sqlite,
    Postgres,
    Mysql,
    Mssql,
    Bigquery,
    Snowflake,
    Duckdb,
    Ansi,
}

impl Dialect {
    pub const ALL: [Dialect; 9] = [
        Dialect::Generic,
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::Mysql,
        Dialect::Mssql,
        Dialect::Bigquery,
        Dialect::Snowflake,
        Dialect::Duckdb,
        Dialect::Ansi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Mssql => "mssql",
            Dialect::Bigquery => "bigquery",
            Dialect::Snowflake => "snowflake",
            Dialect::Duckdb => "duckdb",
            Dialect::Ansi => "ansi",
        }
    }

    pub fn parse_statements(&self, sql: &str) -> Result<Vec<Statement>, ParserError> {
        match self {
            Dialect::Generic => Parser::parse_sql(&GenericDialect {}, sql),
            Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql),
            Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
            Dialect::Mysql => Parser::parse_sql(&MySqlDialect {}, sql),
            Dialect::Mssql => Parser::parse_sql(&MsSqlDialect {}, sql),
            Dialect::Bigquery => Parser::parse_sql(&BigQueryDialect, sql),
            Dialect::Snowflake => Parser::parse_sql(&SnowflakeDialect, sql),
            Dialect::Duckdb => Parser::parse_sql(&DuckDbDialect {}, sql),
            Dialect::Ansi => Parser::parse_sql(&AnsiDialect {}, sql),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let dialect = match name.as_str() {
            "postgresql" | "pg" => Dialect::Postgres,
            "sqlserver" | "tsql" => Dialect::Mssql,
            "sqlite3" => Dialect::Sqlite,
            _ => Dialect::ALL
                .into_iter()
                .find(|dialect| dialect.name() == name)
                .ok_or_else(|| ParseError::UnknownDialect(s.to_string()))?,
        };
        Ok(dialect)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dialect_names_round_trip() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
        }
    }

    #[test]
    fn dialect_aliases() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!(" SQLite ".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!(matches!(
            "oracle".parse::<Dialect>(),
            Err(ParseError::UnknownDialect(_))
        ));
    }

    #[test]
    fn sqlite_is_default() {
        assert_eq!(Dialect::default(), Dialect::Sqlite);
    }
}
