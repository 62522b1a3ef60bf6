//! # Tiny BASIC
//!
//! Interactive terminal for the interpreter.

fn main() {
    tinybasic::term::main();
}
