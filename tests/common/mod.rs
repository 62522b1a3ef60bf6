#![allow(dead_code)]

use tinybasic::mach::{Config, Event, Runtime};

pub fn exec(runtime: &mut Runtime) -> String {
    exec_n(runtime, 5000)
}

pub fn exec_n(runtime: &mut Runtime, cycles: usize) -> String {
    let mut s = String::new();
    let mut prev_running = false;
    loop {
        let event = runtime.execute(cycles);
        match &event {
            Event::Stopped | Event::Bye => {
                break;
            }
            Event::Error(error) => {
                s.push_str(&format!("{}\n", error));
            }
            Event::Running => {
                if prev_running {
                    s.push_str(&format!("\n{} Execution cycles exceeded.\n", cycles));
                    break;
                }
            }
            Event::Print(ps) => {
                s.push_str(ps);
            }
            Event::Input(ps) => {
                s.push_str(ps);
                break;
            }
        }
        prev_running = matches!(event, Event::Running);
    }
    s
}

/// Enter every line, then run the last one if it is a command.
pub fn program(runtime: &mut Runtime, lines: &[&str]) -> String {
    let mut s = String::new();
    for line in lines {
        runtime.enter(line);
        s.push_str(&exec(runtime));
    }
    s
}

pub fn small_runtime(arena_size: usize) -> Runtime {
    Runtime::new(Config {
        arena_size,
        align: false,
    })
    .unwrap()
}
