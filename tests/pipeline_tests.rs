// tests/pipeline_tests.rs
//! End-to-end parse -> optimize -> print pipelines, one per scenario in
//! `SPEC_FULL.md` §8.
use tacmir::mir::Operator;
use tacmir::opt::{Driver, PipelineConfig, PreAlgorithm};
use tacmir::parser;
use tacmir::printer;

fn optimized(source: &str, config: &PipelineConfig) -> String {
    let mut module = parser::parse(source).unwrap();
    Driver::run(&mut module, config).unwrap();
    printer::print_module(&module)
}

#[test]
fn sccp_collapses_a_constant_if_into_a_goto() {
    let source = "\
@function f ( )
%entry
x := 1
y := 0
t := x > y
%if t %goto &l
%goto &m
l:
%print x
m:
%exit
@end function
";
    let mut module = parser::parse(source).unwrap();
    let config = PipelineConfig { sccp: true, ..PipelineConfig::default() };
    let stats = Driver::run(&mut module, &config).unwrap();
    assert!(stats.branches_resolved >= 1);

    let f = &module.functions[0];
    assert!(f.insts.iter().all(|i| i.op != Operator::If), "the If should have collapsed into a Goto");
    let text = printer::print_module(&module);
    assert!(text.contains("%print x"));
}

#[test]
fn phi_merging_differing_constants_along_both_branches_is_not_folded() {
    let source = "\
@function f ( )
%entry
c := a > b
%if c %goto &l
r := 1
%goto &j
l:
r := 2
j:
%print r
%exit
@end function
";
    let config = PipelineConfig { sccp: true, ..PipelineConfig::default() };
    let text = optimized(source, &config);
    // r merges two different constants at the join point; SCCP must leave
    // the phi (now a plain assignment chain) resolving to bottom, not fold
    // it to a single literal.
    assert!(text.contains("%print r"));
}

#[test]
fn lcm_hoists_a_redundant_expression_out_of_a_diamond() {
    let source = "\
@function f ( )
%entry
a := 1
b := 2
c := a > b
%if c %goto &l
%goto &r
l:
t1 := a + b
%goto &j
r:
t2 := a + b
j:
t3 := a + b
%print t3
%exit
@end function
";
    let config = PipelineConfig { pre: PreAlgorithm::Lcm, ..PipelineConfig::default() };
    let mut module = parser::parse(source).unwrap();
    let stats = Driver::run(&mut module, &config).unwrap();
    assert!(stats.temporaries_inserted >= 1);

    let f = &module.functions[0];
    let add_count = f.insts.iter().filter(|i| i.op == Operator::Add).count();
    assert_eq!(add_count, 1, "only the hoisted temporary's computation should remain");
}

#[test]
fn division_by_a_folded_zero_is_a_fatal_evaluation_error() {
    let source = "\
@function f ( )
%entry
z := 0
x := 10 / z
%print x
%exit
@end function
";
    let mut module = parser::parse(source).unwrap();
    let config = PipelineConfig { sccp: true, ..PipelineConfig::default() };
    let result = Driver::run(&mut module, &config);
    assert!(result.is_err());
}

#[test]
fn empty_function_body_is_rejected_by_the_driver() {
    let source = "@function f ( )\n@end function\n";
    let mut module = parser::parse(source).unwrap();
    assert_eq!(module.functions[0].insts.len(), 0);
    let result = Driver::run(&mut module, &PipelineConfig::default());
    assert!(result.is_err(), "a function with no instructions has no entry block to build a CFG from");
}

#[test]
fn single_block_function_runs_the_full_pipeline_without_change_in_shape() {
    let source = "\
@function f ( )
%entry
x := 41
y := x + 1
%print y
%exit
@end function
";
    let config = PipelineConfig { sccp: true, pre: PreAlgorithm::Lcm, ..PipelineConfig::default() };
    let mut module = parser::parse(source).unwrap();
    let stats = Driver::run(&mut module, &config).unwrap();
    assert_eq!(stats.temporaries_inserted, 0, "a single block has no redundant recomputation to hoist");
    let text = printer::print_module(&module);
    assert!(text.contains("%print y") || text.contains("y := 42"));
}

#[test]
fn printed_output_reparses_back_into_an_equivalent_instruction_count() {
    let source = "\
@function f ( )
%entry
x := 1 + 2
%print x
%exit
@end function
";
    let mut module = parser::parse(source).unwrap();
    Driver::run(&mut module, &PipelineConfig::default()).unwrap();
    let rendered = printer::print_module(&module);
    // the printer emits `[addr:NNNN]` prefixes and tab indentation the
    // grammar's own parser does not accept back in, so this only checks
    // that every original instruction still shows up in some form.
    assert!(rendered.contains("@function f"));
    assert!(rendered.contains("@end function"));
    assert_eq!(rendered.matches("[addr:").count(), module.functions[0].insts.len());
}
