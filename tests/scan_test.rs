// test of the scanner: surface syntaxes, normalization, and the stable
// error contract
use sexpkit::{parse,Format,encode};

fn canonical(src: &[u8]) -> Vec<u8> {
    let sexp = parse(src).expect("scan error");
    encode(sexp.as_ref(),Format::Canonical)
}

#[test]
fn empty_forms_normalize_away() {
    assert!(parse(b"").expect("scan error").is_none());
    assert!(parse(b"()").expect("scan error").is_none());
    assert!(parse(b"  \n\t ( \r\n ) ").expect("scan error").is_none());
}

#[test]
fn token_atoms() {
    assert_eq!(canonical(b"(a b c)"),b"(1:a1:b1:c)".to_vec());
    // the token class covers alphanumerics and key-name punctuation
    assert_eq!(canonical(b"(rsa-pkcs1 x9.62 a/b oid:1.2 *+=)"),
        b"(9:rsa-pkcs15:x9.623:a/b7:oid:1.23:*+=)".to_vec());
    // a trailing token completes at end of input
    assert_eq!(canonical(b"abc"),b"3:abc".to_vec());
}

#[test]
fn raw_atoms() {
    // "4:barbaz" is the four byte atom "barb" followed by the token "az"
    assert_eq!(canonical(b"(3:foo(4:barbaz))"),b"(3:foo(4:barb2:az))".to_vec());
    // raw bytes are copied verbatim, delimiters included
    assert_eq!(canonical(b"(7:a(b) \"c)"),b"(7:a(b) \"c)".to_vec());
    // a top level atom needs no enclosing list
    assert_eq!(canonical(b"3:abc"),b"3:abc".to_vec());
}

#[test]
fn hex_atoms() {
    assert_eq!(canonical(b"(#616263#)"),b"(3:abc)".to_vec());
    // whitespace and mixed case are fine between the delimiters
    assert_eq!(canonical(b"(#61 62\n63#)"),b"(3:abc)".to_vec());
    assert_eq!(canonical(b"(#DEadBEef#)"),b"(4:\xde\xad\xbe\xef)".to_vec());
    assert_eq!(canonical(b"(##)"),b"(0:)".to_vec());
}

#[test]
fn quoted_atoms() {
    assert_eq!(canonical(b"((key \"a\\x21b\"))"),b"((3:key3:a!b))".to_vec());
    assert_eq!(canonical(b"(\"a\\041b\")"),b"(3:a!b)".to_vec());
    assert_eq!(canonical(b"(\"a\\nb\\tc\")"),b"(5:a\nb\tc)".to_vec());
    assert_eq!(canonical(b"(\"say \\\"hi\\\"\")"),b"(8:say \"hi\")".to_vec());
    // escaped line breaks are continuations and vanish
    assert_eq!(canonical(b"(\"ab\\\r\ncd\")"),b"(4:abcd)".to_vec());
    assert_eq!(canonical(b"(\"ab\\\ncd\")"),b"(4:abcd)".to_vec());
}

#[test]
fn base64_atoms() {
    assert_eq!(canonical(b"(|YWJj|)"),b"(3:abc)".to_vec());
    assert_eq!(canonical(b"(|YWJ jZGU=|)"),b"(5:abcde)".to_vec());
}

#[test]
fn optional_length_before_delimited_forms() {
    // a length prefix before a delimited form is discarded
    assert_eq!(canonical(b"(3\"abc\")"),b"(3:abc)".to_vec());
    assert_eq!(canonical(b"(99#61#)"),b"(1:a)".to_vec());
    assert_eq!(canonical(b"(4|YWJj|)"),b"(3:abc)".to_vec());
}

#[test]
fn display_hints_discarded() {
    assert_eq!(canonical(b"(a [text/plain] b)"),b"(1:a1:b)".to_vec());
    assert_eq!(canonical(b"([hint]x)"),b"(1:x)".to_vec());
}

#[test]
fn canonical_round_trip() {
    let src: &[u8] = b"(public-key (rsa (n #00C0FFEE#) (e \"a\\x21b\") (d |YWJj|) 5:hello))";
    let first = parse(src).expect("scan error").expect("tree expected");
    let wire = first.encode(Format::Canonical);
    let second = parse(&wire).expect("rescan error").expect("tree expected");
    assert_eq!(first,second);
    assert_eq!(second.encode(Format::Canonical),wire);
}

#[test]
fn error_codes_and_offsets() {
    let cases: Vec<(&[u8],i32,usize)> = vec![
        (b"123abc",-1,3),
        (b"(3:ab",-2,2),
        (b"1:",-2,1),
        (b"\x01",-5,0),
        (b"(%d)",-5,1),
        (b"(\"a\\qb\")",-6,4),
        (b"(\"a\\9b\")",-6,4),
        (b"0:ab",-7,0),
        (b"(a [x [y]])",-8,6),
        (b"]",-9,0),
        (b"(a [x) b)",-9,5),
        (b"{",-10,0),
        (b"(a & b)",-10,3),
        (b"(a \\ b)",-10,3),
        (b"(#61g#)",-11,4),
        (b"(#616#)",-12,5)
    ];
    for (src,code,offset) in cases {
        let err = parse(src).expect_err("scan should fail");
        assert_eq!(err.code(),code,"input {:?}",String::from_utf8_lossy(src));
        assert_eq!(err.offset(),offset,"input {:?}",String::from_utf8_lossy(src));
    }
}

#[test]
fn dangling_constructs() {
    let cases: Vec<(&[u8],i32,usize)> = vec![
        (b"(\"abc",-6,1),
        (b"(#6162",-12,1),
        (b"(|YWJj",-5,1),
        (b"(12",-2,1),
        (b"(a [hint",-9,3)
    ];
    for (src,code,offset) in cases {
        let err = parse(src).expect_err("scan should fail");
        assert_eq!(err.code(),code,"input {:?}",String::from_utf8_lossy(src));
        assert_eq!(err.offset(),offset,"input {:?}",String::from_utf8_lossy(src));
    }
}

#[test]
fn atom_too_big_for_length_field() {
    // quoted and delimited atoms carry no length prefix, so the 16-bit cap
    // is enforced when the atom is emitted, reported at its opening byte
    let mut src: Vec<u8> = b"(\"".to_vec();
    src.extend(std::iter::repeat(b'a').take(70000));
    src.extend_from_slice(b"\")");
    let err = parse(&src).expect_err("scan should fail");
    assert_eq!((err.code(),err.offset()),(-2,1));

    let mut src: Vec<u8> = b"(#".to_vec();
    src.extend(std::iter::repeat(b'6').take(140000));
    src.extend_from_slice(b"#)");
    let err = parse(&src).expect_err("scan should fail");
    assert_eq!((err.code(),err.offset()),(-2,1));
}

#[test]
fn error_messages() {
    let err = parse(b"0:").expect_err("scan should fail");
    assert_eq!(err.to_string(),"length prefix begins with zero at offset 0");
}
