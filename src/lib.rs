//! # Tiny BASIC
//!
//! A Tiny BASIC interpreter in the style of the small integer BASICs that
//! ran on boards with a few kilobytes of RAM. Program text, the line being
//! typed and the `FOR`/`GOSUB` stack all live in one fixed block of memory.
//!
//! ```
//! use tinybasic::mach::{Event, Runtime};
//!
//! let mut runtime = Runtime::default();
//! runtime.enter("10 FOR I=1 TO 3");
//! runtime.enter("20 PRINT I;");
//! runtime.enter("30 NEXT I");
//! runtime.enter("RUN");
//! match runtime.execute(1000) {
//!     Event::Print(s) => assert_eq!(s, "123"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! Set `RUST_LOG=tinybasic=debug` to watch lines being stored and
//! programs being saved and loaded.

pub mod lang;
pub mod mach;
pub mod term;
