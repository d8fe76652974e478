//! Global subscriber installation, kept in its own test binary so the
//! subscriber does not leak into other tests.

use glucoled::logging::init_logging;

#[test]
fn second_init_fails() {
    assert!(init_logging("warn").is_ok());
    assert!(init_logging("warn").is_err());
}
