use brainblocks::{
    brackets::BracketSide,
    cfg::{BlockId, ControlFlowGraph, Terminator, TerminatorKind},
    interpreter::{Runtime, RuntimeError, TapeInterpreter},
    io::MemoryIo,
    Config, Error, Program,
};

fn small_tape() -> Config {
    Config {
        tape_length: 16,
        ..Config::default()
    }
}

#[test]
fn clear_loop_on_a_seeded_cell() {
    let program = Program::compile("[-]").unwrap();
    assert_eq!(program.brackets().pair_count(), 1);

    let mut runtime: Runtime<u8, _> = Runtime::new(16, 0, MemoryIo::default());
    runtime.set_cell(0, 5);
    TapeInterpreter::new(&program).run(&mut runtime).unwrap();
    assert_eq!(runtime.tape()[0], 0);

    let cfg = brainblocks::lower(&program, &small_tape()).unwrap();
    assert_eq!(cfg.blocks().len(), 3);
    let labels: Vec<_> = cfg.blocks().iter().map(|b| b.label.clone()).collect();
    assert_eq!(labels, ["entry", "loop_body1", "loop_exit1"]);
}

#[test]
fn transfer_loop() {
    let program = Program::compile("++>+++<[->+<]").unwrap();
    let result = brainblocks::interpret(&program, &small_tape(), &mut MemoryIo::default()).unwrap();
    assert_eq!(result.tape[0], 0);
    assert_eq!(result.tape[1], 5);
    assert_eq!(result.cursor, 0);
}

#[test]
fn lone_close_bracket() {
    match Program::compile("]") {
        Err(Error::Bracket(e)) => {
            assert_eq!(e.position.offset, 0);
            assert_eq!(e.kind, BracketSide::CloseWithoutOpen);
        }
        other => panic!("expected an unmatched bracket, got {:?}", other),
    }
}

#[test]
fn moving_right_off_the_tape() {
    let config = small_tape();
    let program = Program::compile(&">".repeat(config.tape_length)).unwrap();
    match brainblocks::interpret(&program, &config, &mut MemoryIo::default()) {
        Err(Error::Runtime(RuntimeError::TapeOverflow { position, tape_length })) => {
            assert_eq!(position.offset, config.tape_length - 1);
            assert_eq!(tape_length, config.tape_length);
        }
        other => panic!("expected a tape overflow, got {:?}", other),
    }

    // one move fewer is fine
    let program = Program::compile(&">".repeat(config.tape_length - 1)).unwrap();
    let result = brainblocks::interpret(&program, &config, &mut MemoryIo::default()).unwrap();
    assert_eq!(result.cursor, config.tape_length - 1);
}

#[test]
fn moving_right_off_the_default_tape() {
    let config = Config::default();
    let program = Program::compile(&">".repeat(config.tape_length)).unwrap();
    assert!(matches!(
        brainblocks::interpret(&program, &config, &mut MemoryIo::default()),
        Err(Error::Runtime(RuntimeError::TapeOverflow { tape_length: 65536, .. }))
    ));
}

#[test]
fn unknown_character() {
    match Program::compile("?") {
        Err(Error::Lex(e)) => {
            assert_eq!(e.position.offset, 0);
            assert_eq!(e.character, '?');
        }
        other => panic!("expected a lex error, got {:?}", other),
    }
}

#[test]
fn bad_character_after_output_produces_no_output() {
    // validation runs to completion before anything executes
    let mut io = MemoryIo::default();
    let result = Program::compile("+++.x").and_then(|p| brainblocks::interpret(&p, &small_tape(), &mut io));
    assert!(matches!(result, Err(Error::Lex(_))));
    assert!(io.output.is_empty());
}

#[test]
fn count_to_five() {
    let source = "++++++++ ++++++++ ++++++++ ++++++++ ++++++++ ++++++++ >+++++ [<+.>-]";
    let program = Program::compile(source).unwrap();
    let mut io = MemoryIo::default();
    brainblocks::interpret(&program, &small_tape(), &mut io).unwrap();
    assert_eq!(io.output_string(), "12345");

    let cfg = brainblocks::lower(&program, &small_tape()).unwrap();
    let mut io = MemoryIo::default();
    brainblocks::execute(&cfg, &small_tape(), &mut io).unwrap();
    assert_eq!(io.output_string(), "12345");
}

#[test]
fn eof_policy_is_configurable() {
    let program = Program::compile(",").unwrap();
    let zero = brainblocks::interpret(&program, &small_tape(), &mut MemoryIo::default()).unwrap();
    assert_eq!(zero.tape[0], 0);

    let minus_one = Config {
        eof_value: u32::MAX,
        ..small_tape()
    };
    let result = brainblocks::interpret(&program, &minus_one, &mut MemoryIo::default()).unwrap();
    assert_eq!(result.tape[0], 255);

    let cfg = brainblocks::lower(&program, &minus_one).unwrap();
    let outcome = brainblocks::execute(&cfg, &minus_one, &mut MemoryIo::default()).unwrap();
    assert_eq!(outcome.tape[0], 255);
}

#[test]
fn sequential_loops_chain_through_exit_blocks() {
    let program = Program::compile("+[-]+[-]").unwrap();
    let cfg = brainblocks::lower(&program, &small_tape()).unwrap();
    assert_eq!(cfg.blocks().len(), 5);

    // the first loop's exit block opens the second loop
    assert!(matches!(
        cfg.block(BlockId(2)).unwrap().terminator,
        Terminator::CondBranch { if_true: BlockId(4), if_false: BlockId(3), .. }
    ));
    assert_eq!(cfg.block(BlockId(4)).unwrap().terminator.kind(), TerminatorKind::Return);
    assert_eq!(cfg.predecessors(BlockId(3)), vec![BlockId(2), BlockId(3)]);
    assert!(cfg.predecessors(ControlFlowGraph::ENTRY).is_empty());
}
