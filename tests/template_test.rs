// test of template scanning and sensitive storage propagation
use sexpkit::{parse_template,Arg,Format,Mpi,MpiFormat};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn string_and_int_substitution() {
    init_logging();
    let sexp = parse_template(b"(user %s uid %d)",&[Arg::Str("alice"),Arg::Int(1001)])
        .expect("scan error").expect("tree expected");
    assert_eq!(sexp.encode(Format::Canonical),b"(4:user5:alice3:uid4:1001)".to_vec());
    assert!(!sexp.is_sensitive());
}

#[test]
fn negative_int_substitution() {
    let sexp = parse_template(b"(delta %d)",&[Arg::Int(-42)])
        .expect("scan error").expect("tree expected");
    assert_eq!(sexp.encode(Format::Canonical),b"(5:delta3:-42)".to_vec());
}

#[test]
fn mpi_substitution() {
    let m = Mpi::scan(&[0xde,0xad,0xbe,0xef],MpiFormat::Std).expect("scan error");
    let sexp = parse_template(b"(sig %m)",&[Arg::Mpi(&m)])
        .expect("scan error").expect("tree expected");
    assert_eq!(sexp.encode(Format::Canonical),b"(3:sig4:\xde\xad\xbe\xef)".to_vec());
    assert!(!sexp.is_sensitive());
}

#[test]
fn sensitive_mpi_upgrades_tree() {
    let mut m = Mpi::scan(&[0xde,0xad,0xbe,0xef],MpiFormat::Std).expect("scan error");
    m.set_secure(true);
    let sexp = parse_template(b"(sig %m)",&[Arg::Mpi(&m)])
        .expect("scan error").expect("tree expected");
    assert!(sexp.is_sensitive());
    assert_eq!(sexp.encode(Format::Canonical),b"(3:sig4:\xde\xad\xbe\xef)".to_vec());
    // extraction allocates fresh ordinary trees; sensitivity does not flow
    // back out of the original
    let car = sexp.car().expect("no car");
    assert!(!car.is_sensitive());
    let found = sexp.find_token(b"sig").expect("not found");
    assert!(!found.is_sensitive());
}

#[test]
fn arguments_consumed_in_textual_order() {
    let m = Mpi::from_uint(7);
    let sexp = parse_template(b"(%s %d %m)",&[Arg::Str("x"),Arg::Int(2),Arg::Mpi(&m)])
        .expect("scan error").expect("tree expected");
    assert_eq!(sexp.encode(Format::Canonical),b"(1:x1:21:\x07)".to_vec());
}

#[test]
fn template_errors() {
    // an unknown directive and an exhausted argument list both fail at the
    // directive byte
    let err = parse_template(b"(%q)",&[Arg::Int(1)]).expect_err("should fail");
    assert_eq!((err.code(),err.offset()),(-1,2));
    let err = parse_template(b"(%d %d)",&[Arg::Int(1)]).expect_err("should fail");
    assert_eq!((err.code(),err.offset()),(-1,5));
    // a directive whose argument has the wrong tag also fails there
    let err = parse_template(b"(%m)",&[Arg::Int(1)]).expect_err("should fail");
    assert_eq!((err.code(),err.offset()),(-1,2));
    // a dangling percent at end of input
    let err = parse_template(b"(a %",&[Arg::Int(1)]).expect_err("should fail");
    assert_eq!((err.code(),err.offset()),(-1,3));
}
