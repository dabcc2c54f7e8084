//! Parameter declaration and read glue emitted into the assembled program.
//!
//! The parameter schema itself belongs to the solver library; this module
//! only emits the C++ declarations and the `read_parameters` subroutine that
//! pulls values out of the run-state container through the library helpers.

use vort_core::{ParamValue, Parameters};

/// Renders one C++ variable declaration per parameter, in name order.
pub fn declarations(parameters: &Parameters) -> String {
    let mut out = String::new();
    for (name, value) in parameters.iter() {
        match value {
            ParamValue::Int(_) => out.push_str(&format!("int {name};\n")),
            ParamValue::Float(_) => out.push_str(&format!("double {name};\n")),
            ParamValue::Text(_) => out.push_str(&format!("char {name}[512];\n")),
        }
    }
    out
}

/// Renders the `read_parameters` subroutine filling the declared variables
/// from an open run-state handle.
pub fn read_definition(parameters: &Parameters) -> String {
    let mut out = String::from("int read_parameters(run_state *state)\n{\n");
    for (name, value) in parameters.iter() {
        let line = match value {
            ParamValue::Int(_) => {
                format!("    {name} = run_state_read_int(state, \"{name}\");\n")
            }
            ParamValue::Float(_) => {
                format!("    {name} = run_state_read_double(state, \"{name}\");\n")
            }
            ParamValue::Text(_) => format!(
                "    run_state_read_text(state, \"{name}\", {name}, sizeof({name}));\n"
            ),
        };
        out.push_str(&line);
    }
    out.push_str("    return EXIT_SUCCESS;\n}\n");
    out
}
