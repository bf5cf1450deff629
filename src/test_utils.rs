/// # Test Utilities Module
///
/// A scripted in-memory native driver for unit tests.
///
/// `ScriptedDriver` answers queries from canned responses matched by
/// substring and records every native call it receives (connection strings,
/// statements, options, binds, executions, released statements) so tests can
/// assert on the exact calling sequence. Clones share state: keep one clone
/// as a probe after moving the other into a `Connection`.
use crate::config::ConnectionSettings;
use crate::core::db::native::{
    NativeDriver, NativeSession, ResultSet, StatementHandle, TypeTag, Value,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Settings used across unit tests
pub fn settings() -> ConnectionSettings {
    ConnectionSettings::new("demo_engine", "demo", "db.internal", "dba", "secret")
}

/// Builds a result set from column names and rows of values
pub fn result_set(columns: &[&str], rows: Vec<Vec<Value>>) -> ResultSet {
    ResultSet::new(columns.iter().map(|c| c.to_string()).collect(), rows)
}

/// One recorded native bind call
#[derive(Debug, Clone, PartialEq)]
pub struct Bind {
    pub handle: StatementHandle,
    pub index: usize,
    pub value: Value,
    pub tag: TypeTag,
    pub is_null: bool,
}

#[derive(Debug, Clone)]
struct NativeFailure {
    sqlstate: String,
    code: i32,
    message: String,
}

#[derive(Debug, Clone)]
enum Response {
    Rows(ResultSet),
    Fail(NativeFailure),
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: Vec<(String, Response)>,
    refuse_connections: Option<String>,
    fail_next_execute: Option<NativeFailure>,
    fail_bind_index: Option<usize>,
    last_error: Option<NativeFailure>,
    dsns: Vec<(String, bool)>,
    statements: Vec<String>,
    options: Vec<(String, i32)>,
    commits: usize,
    rollbacks: usize,
    prepared: HashMap<StatementHandle, String>,
    next_handle: u32,
    binds: Vec<Bind>,
    executions: Vec<StatementHandle>,
    freed: Vec<StatementHandle>,
    closed_sessions: usize,
    insert_id: u64,
    affected_rows: u64,
}

impl ScriptState {
    fn lookup(&self, sql: &str) -> Option<Response> {
        self.responses
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
    }

    fn failure_for(&self, sql: &str) -> Option<NativeFailure> {
        match self.lookup(sql) {
            Some(Response::Fail(failure)) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        ScriptedDriver::default()
    }

    /// Queries containing `needle` return `rows`
    pub fn respond(&self, needle: &str, rows: ResultSet) {
        self.state
            .borrow_mut()
            .responses
            .push((needle.to_string(), Response::Rows(rows)));
    }

    /// Queries and prepares containing `needle` fail with the given error
    pub fn fail_on(&self, needle: &str, sqlstate: &str, code: i32, message: &str) {
        self.state.borrow_mut().responses.push((
            needle.to_string(),
            Response::Fail(NativeFailure {
                sqlstate: sqlstate.to_string(),
                code,
                message: message.to_string(),
            }),
        ));
    }

    /// Every connect attempt fails with `message`
    pub fn refuse_connections(&self, message: &str) {
        self.state.borrow_mut().refuse_connections = Some(message.to_string());
    }

    /// The next statement execution fails with the given error
    pub fn fail_next_execute(&self, sqlstate: &str, code: i32, message: &str) {
        self.state.borrow_mut().fail_next_execute = Some(NativeFailure {
            sqlstate: sqlstate.to_string(),
            code,
            message: message.to_string(),
        });
    }

    /// Binding the parameter at `index` fails
    pub fn fail_bind_at(&self, index: usize) {
        self.state.borrow_mut().fail_bind_index = Some(index);
    }

    pub fn set_counters(&self, insert_id: u64, affected_rows: u64) {
        let mut state = self.state.borrow_mut();
        state.insert_id = insert_id;
        state.affected_rows = affected_rows;
    }

    /// Connection strings seen, with the persistent flag
    pub fn dsns(&self) -> Vec<(String, bool)> {
        self.state.borrow().dsns.clone()
    }

    /// Raw statements passed to `query`, in order
    pub fn statements(&self) -> Vec<String> {
        self.state.borrow().statements.clone()
    }

    pub fn options(&self) -> Vec<(String, i32)> {
        self.state.borrow().options.clone()
    }

    pub fn commits(&self) -> usize {
        self.state.borrow().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.borrow().rollbacks
    }

    /// SQL text of every statement prepared so far
    pub fn prepared_sql(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut entries: Vec<_> = state.prepared.iter().collect();
        entries.sort_by_key(|(handle, _)| handle.0);
        entries.into_iter().map(|(_, sql)| sql.clone()).collect()
    }

    pub fn binds(&self) -> Vec<Bind> {
        self.state.borrow().binds.clone()
    }

    pub fn executions(&self) -> Vec<StatementHandle> {
        self.state.borrow().executions.clone()
    }

    pub fn freed(&self) -> Vec<StatementHandle> {
        self.state.borrow().freed.clone()
    }

    pub fn closed_sessions(&self) -> usize {
        self.state.borrow().closed_sessions
    }

    fn open(&self, dsn: &str, persistent: bool) -> Result<ScriptedSession, String> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.refuse_connections {
            return Err(message.clone());
        }
        state.dsns.push((dsn.to_string(), persistent));
        Ok(ScriptedSession {
            state: Rc::clone(&self.state),
        })
    }
}

impl NativeDriver for ScriptedDriver {
    type Session = ScriptedSession;

    fn connect(&self, dsn: &str) -> Result<ScriptedSession, String> {
        self.open(dsn, false)
    }

    fn pconnect(&self, dsn: &str) -> Result<ScriptedSession, String> {
        self.open(dsn, true)
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedSession {
    fn succeed(&self) {
        self.state.borrow_mut().last_error = None;
    }

    fn fail(&self, failure: NativeFailure) {
        self.state.borrow_mut().last_error = Some(failure);
    }
}

impl NativeSession for ScriptedSession {
    fn query(&self, sql: &str) -> Option<ResultSet> {
        let response = {
            let mut state = self.state.borrow_mut();
            state.statements.push(sql.to_string());
            state.lookup(sql)
        };
        match response {
            Some(Response::Fail(failure)) => {
                self.fail(failure);
                None
            }
            Some(Response::Rows(rows)) => {
                self.succeed();
                Some(rows)
            }
            None => {
                self.succeed();
                Some(ResultSet::empty())
            }
        }
    }

    fn errorcode(&self) -> i32 {
        self.state.borrow().last_error.as_ref().map_or(0, |e| e.code)
    }

    fn sqlstate(&self) -> String {
        self.state
            .borrow()
            .last_error
            .as_ref()
            .map_or_else(|| "00000".to_string(), |e| e.sqlstate.clone())
    }

    fn error(&self) -> String {
        self.state
            .borrow()
            .last_error
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_default()
    }

    fn real_escape_string(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    fn insert_id(&self) -> u64 {
        self.state.borrow().insert_id
    }

    fn affected_rows(&self) -> u64 {
        self.state.borrow().affected_rows
    }

    fn set_option(&self, option: &str, value: i32) -> bool {
        self.state
            .borrow_mut()
            .options
            .push((option.to_string(), value));
        self.succeed();
        true
    }

    fn commit(&self) -> bool {
        self.state.borrow_mut().commits += 1;
        self.succeed();
        true
    }

    fn rollback(&self) -> bool {
        self.state.borrow_mut().rollbacks += 1;
        self.succeed();
        true
    }

    fn prepare(&self, sql: &str) -> Option<StatementHandle> {
        let failure = self.state.borrow().failure_for(sql);
        if let Some(failure) = failure {
            self.fail(failure);
            return None;
        }

        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = StatementHandle(state.next_handle);
        state.prepared.insert(handle, sql.to_string());
        state.last_error = None;
        Some(handle)
    }

    fn stmt_bind_param_ex(
        &self,
        stmt: StatementHandle,
        index: usize,
        value: &Value,
        tag: TypeTag,
        is_null: bool,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        if state.fail_bind_index == Some(index) {
            state.last_error = Some(NativeFailure {
                sqlstate: "07009".to_string(),
                code: -689,
                message: "Input parameter index out of range".to_string(),
            });
            return false;
        }
        state.binds.push(Bind {
            handle: stmt,
            index,
            value: value.clone(),
            tag,
            is_null,
        });
        state.last_error = None;
        true
    }

    fn stmt_execute(&self, stmt: StatementHandle) -> bool {
        let mut state = self.state.borrow_mut();
        state.executions.push(stmt);
        match state.fail_next_execute.take() {
            Some(failure) => {
                state.last_error = Some(failure);
                false
            }
            None => {
                state.last_error = None;
                true
            }
        }
    }

    fn stmt_free_result(&self, stmt: StatementHandle) -> bool {
        let mut state = self.state.borrow_mut();
        state.freed.push(stmt);
        state.prepared.contains_key(&stmt)
    }

    fn close(&self) {
        self.state.borrow_mut().closed_sessions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_driver_records_calls() {
        let driver = ScriptedDriver::new();
        let probe = driver.clone();
        driver.respond("from t", result_set(&["a"], vec![vec![Value::from(1)]]));

        let session = driver.connect("dsn").unwrap();
        assert_eq!(session.query("select a from t").unwrap().len(), 1);
        assert!(session.query("select 1").unwrap().is_empty());
        assert_eq!(probe.statements().len(), 2);
        assert_eq!(probe.dsns(), vec![("dsn".to_string(), false)]);
    }

    #[test]
    fn test_scripted_prepare_failure_sets_error() {
        let driver = ScriptedDriver::new();
        driver.fail_on("bogus", "42000", -131, "Syntax error");
        let session = driver.connect("dsn").unwrap();

        assert!(session.prepare("bogus ?").is_none());
        assert_eq!(session.errorcode(), -131);
        assert!(session.prepare("select ?").is_some());
        assert_eq!(session.errorcode(), 0);
    }
}
