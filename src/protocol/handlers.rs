//! Request handlers for the file server.
//!
//! Dispatches parsed commands to the storage operations and shapes the
//! outcome for the binding the request came in on.

use log::debug;

use crate::error::{FsError, error_to_status, handle_error};
use crate::protocol::commands::{Command, FrameKind};
use crate::protocol::parser::{Request, RequestError, parse_request};
use crate::protocol::responses::{Output, Reply};
use crate::protocol::tools;
use crate::storage::{self, BaseDir};

/// Runs a command against the base directory.
///
/// # Arguments
///
/// * `base` - The base directory every path is resolved against.
/// * `command` - The operation and its parameters.
///
/// # Returns
///
/// * `Result<Output, FsError>` - The operation result or its error kind.
pub fn execute(base: &BaseDir, command: &Command) -> Result<Output, FsError> {
    match command {
        Command::Read { file_path } => storage::read_file(base, file_path).map(Output::Read),
        Command::Write { file_path, content } => {
            storage::write_file(base, file_path, content).map(Output::Write)
        }
        Command::List { dir_path } => storage::list_directory(base, dir_path).map(Output::List),
        Command::Delete { file_path } => storage::delete_file(base, file_path).map(Output::Delete),
        Command::Move {
            source_path,
            destination_path,
        } => storage::move_file(base, source_path, destination_path).map(Output::Move),
        Command::Copy {
            source_path,
            destination_path,
        } => storage::copy_file(base, source_path, destination_path).map(Output::Copy),
    }
}

/// Executes a parsed request and builds its reply
pub fn handle_request(base: &BaseDir, request: Request) -> Reply {
    debug!("Handling {:?} request: {:?}", request.kind, request.command);

    let result = execute(base, &request.command);
    if let Err(e) = &result {
        handle_error(request.command.name(), e);
    }

    match request.kind {
        FrameKind::Call => match result {
            Ok(output) => Reply::success(request.id, output),
            Err(e) => Reply::failure(request.id, error_to_status(&e), e.to_string()),
        },
        FrameKind::Tool => Reply::text(request.id, tools::render(result)),
    }
}

/// Reply for a frame that could not be parsed
pub fn handle_request_error(err: RequestError) -> Reply {
    debug!("Rejected request: {}", err);
    match err.kind {
        FrameKind::Call => Reply::bad_request(err.id, err.message),
        FrameKind::Tool => Reply::text(err.id, tools::render_error(&err.message)),
    }
}

/// Parses and handles one raw request line
pub fn handle_line(base: &BaseDir, line: &str) -> Reply {
    match parse_request(line) {
        Ok(request) => handle_request(base, request),
        Err(err) => handle_request_error(err),
    }
}
