//! Prints the decoded state of a few capability dumps, one per wire form.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use capdecode_core::{decode_compressed, decode_full, decode_structured, DecodeResult};

fn push_bits(digits: &mut String, value: u64, width: usize) {
    for position in (0..width).rev() {
        digits.push(if (value >> position) & 1 == 1 { '1' } else { '0' });
    }
}

fn compressed_sample() -> String {
    let mut digits = String::new();
    digits.push('1');
    push_bits(&mut digits, 0x7FFF, 15);
    push_bits(&mut digits, 0, 2);
    push_bits(&mut digits, 48, 6);
    digits.push('0');
    push_bits(&mut digits, 0x1, 20);
    push_bits(&mut digits, 0x3, 20);
    push_bits(&mut digits, 0x5, 64);
    digits
}

fn full_sample() -> String {
    let mut digits = String::new();
    digits.push('1');
    push_bits(&mut digits, 0, 8);
    push_bits(&mut digits, 0x0007_FFFF, 31);
    push_bits(&mut digits, 0, 24);
    digits.push('0');
    push_bits(&mut digits, 0x4, 64);
    push_bits(&mut digits, 0x1, 64);
    push_bits(&mut digits, 0x2, 64);
    digits
}

fn report(label: &str, result: &DecodeResult) {
    match result {
        DecodeResult::Value(cap) => println!(
            "{label}: tag={} sealed={} perms={:#x} type={:#x} base={:#x} length={:#x} offset={:#x}",
            cap.tag, cap.sealed, cap.permissions, cap.object_type, cap.base, cap.length, cap.offset,
        ),
        DecodeResult::Undefined => println!("{label}: hardware-undefined"),
        DecodeResult::Malformed(kind) => println!("{label}: malformed ({kind})"),
    }
}

fn main() {
    report("compressed", &decode_compressed(&compressed_sample()));
    report("full", &decode_full(&full_sample()));
    report(
        "structured",
        &decode_structured(
            "t:1 s:0 perms:0x7ffff type:0x0 offset:0x4 base:0x1 length:0x2",
        ),
    );

    let mut undefined = compressed_sample();
    undefined.replace_range(40..41, "u");
    report("undefined", &decode_compressed(&undefined));
}
