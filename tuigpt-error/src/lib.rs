//! # tuigpt-error
//!
//! One error type for every fallible tuigpt operation.
//!
//! An [`Error`] answers three questions:
//!
//! - what went wrong: [`ErrorKind`], e.g. `BinaryContent` or `RateLimited`
//! - whether to try again: [`ErrorStatus`], derived from the kind and turned
//!   `Persistent` once a retry loop gives up
//! - where: the operation name plus free-form `key: value` context
//!
//! The message is the text shown to the user; everything else is for logs.
//!
//! ```rust
//! use tuigpt_error::{Error, ErrorKind};
//!
//! fn open_notes() -> tuigpt_error::Result<String> {
//!     Err(Error::new(ErrorKind::FileNotFound, "Файл не найден: notes.txt")
//!         .with_operation("fs::read_file")
//!         .with_context("path", "notes.txt"))
//! }
//!
//! let err = open_notes().unwrap_err();
//! assert_eq!(err.to_string(), "[FileNotFound/permanent] fs::read_file: Файл не найден: notes.txt (path=notes.txt)");
//! ```
//!
//! Lower layers set the operation; callers further up call `with_operation`
//! again and the earlier name is kept as `called` context. Foreign errors
//! are attached with `set_source` rather than converted implicitly, except
//! for `std::io::Error`.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

pub type Result<T> = std::result::Result<T, Error>;
