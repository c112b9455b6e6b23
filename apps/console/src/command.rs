use shared::domain::{AnalysisId, RepositoryId};

pub const HELP: &str = "\
commands:
  submit <url>       request analysis of a repository
  select <repo-id>   show analyses of a repository
  clear              deselect the active repository
  compare <id>       toggle an analysis for comparison
  refresh            reload the repository list
  show               redraw the dashboard
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Select(RepositoryId),
    Clear,
    Compare(AnalysisId),
    Refresh,
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        match verb.to_ascii_lowercase().as_str() {
            "submit" => Ok(Self::Submit(rest.to_string())),
            "select" => parse_id(rest).map(|id| Self::Select(RepositoryId(id))),
            "clear" => Ok(Self::Clear),
            "compare" => parse_id(rest).map(|id| Self::Compare(AnalysisId(id))),
            "refresh" => Ok(Self::Refresh),
            "show" | "" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command `{other}`, try `help`")),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse()
        .map_err(|_| format!("expected a numeric id, got `{raw}`"))
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
