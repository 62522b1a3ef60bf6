mod common;
use common::*;
use tinybasic::mach::Runtime;

#[test]
fn test_print_items() {
    let mut r = Runtime::default();
    r.enter(r#"print "HELLO",1+2"#);
    assert_eq!(exec(&mut r), "HELLO3\n");
    r.enter(r#"?'single quotes'"#);
    assert_eq!(exec(&mut r), "single quotes\n");
    r.enter("print");
    assert_eq!(exec(&mut r), "\n");
    r.enter("? -5");
    assert_eq!(exec(&mut r), "-5\n");
}

#[test]
fn test_print_trailing_semicolon() {
    let mut r = Runtime::default();
    r.enter(r#"10 print "A";"#);
    r.enter(r#"20 print "B""#);
    r.enter("run");
    assert_eq!(exec(&mut r), "AB\n");
}

#[test]
fn test_print_semicolon_between_items() {
    let mut r = Runtime::default();
    r.enter("?1;2");
    assert_eq!(exec(&mut r), "SYNTAX ERROR; EXPECTED SEPARATOR\n");
}

#[test]
fn test_print_trailing_comma() {
    let mut r = Runtime::default();
    r.enter("?1,");
    assert_eq!(exec(&mut r), "1SYNTAX ERROR; EXPECTED EXPRESSION\n");
    r.enter("10 ?\"A\", ");
    r.enter("run");
    assert_eq!(exec(&mut r), "ASYNTAX ERROR IN 10; EXPECTED EXPRESSION\n");
}

#[test]
fn test_let() {
    let mut r = Runtime::default();
    r.enter("let a=5:b=a*2:?a,b");
    assert_eq!(exec(&mut r), "510\n");
    r.enter("a=1 2");
    assert_eq!(exec(&mut r), "SYNTAX ERROR; UNEXPECTED TEXT\n");
    r.enter("let 5=a");
    assert_eq!(exec(&mut r), "SYNTAX ERROR; EXPECTED VARIABLE\n");
}

#[test]
fn test_goto() {
    let mut r = Runtime::default();
    r.enter("10 a=1");
    r.enter("20 goto 40");
    r.enter("30 a=2");
    r.enter("40 ?a");
    r.enter("run");
    assert_eq!(exec(&mut r), "1\n");
    r.enter("goto 30");
    assert_eq!(exec(&mut r), "2\n");
    r.enter("goto 35");
    assert_eq!(exec(&mut r), "UNDEFINED LINE\n");
}

#[test]
fn test_jump_above_32767() {
    let mut r = Runtime::default();
    r.enter("40000 ?\"HIGH\":return");
    r.enter("goto 40000");
    assert_eq!(exec(&mut r), "HIGH\nRETURN WITHOUT GOSUB IN 40000\n");
    r.enter("gosub 40000:?\"BACK\"");
    assert_eq!(exec(&mut r), "HIGH\nBACK\n");
    r.enter("if 1 then 40000");
    assert_eq!(exec(&mut r), "HIGH\nRETURN WITHOUT GOSUB IN 40000\n");
    r.enter("goto 65536");
    assert_eq!(exec(&mut r), "UNDEFINED LINE\n");
}

#[test]
fn test_computed_goto() {
    let mut r = Runtime::default();
    r.enter("10 a=2");
    r.enter("20 goto a*100");
    r.enter("100 ?1");
    r.enter("200 ?2");
    r.enter("run");
    assert_eq!(exec(&mut r), "2\n");
}

#[test]
fn test_rem() {
    let mut r = Runtime::default();
    r.enter("10 rem hello:print 1");
    r.enter("20 ' comment");
    r.enter("30 ?2");
    r.enter("run");
    assert_eq!(exec(&mut r), "2\n");
}

#[test]
fn test_end_and_stop() {
    let mut r = Runtime::default();
    r.enter("10 ?1");
    r.enter("20 end");
    r.enter("30 ?2");
    r.enter("run");
    assert_eq!(exec(&mut r), "1\n");
    r.enter("20 stop");
    r.enter("run");
    assert_eq!(exec(&mut r), "1\n");
}

#[test]
fn test_run_keeps_variables() {
    let mut r = Runtime::default();
    r.enter("a=7");
    exec(&mut r);
    r.enter("10 ?a");
    r.enter("run");
    assert_eq!(exec(&mut r), "7\n");
}

#[test]
fn test_list() {
    let mut r = Runtime::default();
    r.enter("20 ?2");
    r.enter("10   print \"Mixed Case\"");
    r.enter("list");
    assert_eq!(exec(&mut r), "10 PRINT \"Mixed Case\"\n20 ?2\n");
    r.enter("list 15");
    assert_eq!(exec(&mut r), "20 ?2\n");
    r.enter("10");
    r.enter("list");
    assert_eq!(exec(&mut r), "20 ?2\n");
}

#[test]
fn test_new() {
    let mut r = Runtime::default();
    r.enter("10 ?1");
    r.enter("a=3");
    exec(&mut r);
    r.enter("new");
    assert_eq!(exec(&mut r), "");
    r.enter("list");
    assert_eq!(exec(&mut r), "");
    r.enter("?a");
    assert_eq!(exec(&mut r), "0\n");
}

#[test]
fn test_mem() {
    let mut r = Runtime::default();
    r.enter("mem");
    assert_eq!(exec(&mut r), "65466 BYTES FREE.\n");
    r.enter("10 rem");
    r.enter("mem");
    assert_eq!(exec(&mut r), "65459 BYTES FREE.\n");
}

#[test]
fn test_poke_peek() {
    let mut r = Runtime::default();
    r.enter("poke 1000,65:?peek(1000)");
    assert_eq!(exec(&mut r), "65\n");
    r.enter("poke 0,1");
    assert_eq!(exec(&mut r), "ILLEGAL FUNCTION CALL; ADDRESS OUT OF RANGE\n");
    r.enter("10 rem");
    r.enter("?peek(3)");
    assert_eq!(exec(&mut r), "82\n");
}

#[test]
fn test_rseed() {
    let mut r = Runtime::default();
    r.enter("rseed 5:a=rnd(1000):rseed 5:b=rnd(1000):?a=b");
    assert_eq!(exec(&mut r), "1\n");
}

#[test]
fn test_bye() {
    let mut r = Runtime::default();
    r.enter("10 ?1:bye");
    r.enter("run");
    assert_eq!(exec(&mut r), "1\n");
    assert!(!r.enter("?2"));
}

#[test]
fn test_unknown_statement() {
    let mut r = Runtime::default();
    r.enter("10 frobnicate");
    r.enter("run");
    assert_eq!(exec(&mut r), "SYNTAX ERROR IN 10; EXPECTED VARIABLE\n");
}

#[test]
fn test_line_too_long() {
    let mut r = Runtime::default();
    r.enter(&format!("10 rem {}", "x".repeat(300)));
    assert_eq!(exec(&mut r), "LINE BUFFER OVERFLOW\n");
}

#[test]
fn test_interrupt_between_statements() {
    let mut r = Runtime::default();
    r.enter("10 goto 20");
    r.enter("20 goto 10");
    r.enter("run");
    assert!(exec_n(&mut r, 50).ends_with("Execution cycles exceeded.\n"));
    r.interrupt();
    let out = exec(&mut r);
    assert!(out == "BREAK IN 10\n" || out == "BREAK IN 20\n");
}
