//! The widest union `tagged_union!` accepts.

use tunion::{match_union, tagged_union, Declared};

tagged_union! {
    #[derive(Clone, Debug, PartialEq)]
    union Wide {
        a0: u8,
        a1: u8,
        a2: u8,
        a3: u8,
        a4: u8,
        a5: u8,
        a6: u8,
        a7: u8,
        a8: u8,
        a9: u8,
        a10: u8,
        a11: u8,
        a12: u8,
        a13: u8,
        a14: u8,
        a15: u8,
        a16: u8,
        a17: u8,
        a18: u8,
        a19: u8,
        a20: u8,
        a21: u8,
        a22: u8,
        a23: u8,
        a24: u8,
        a25: u8,
        a26: u8,
        a27: u8,
        a28: u8,
        a29: u8,
        a30: u8,
        a31: u8,
    }
}

#[test]
fn last_alternative_round_trips() {
    let mut w = Wide::create_a31(31);
    assert_eq!(w.get_tag(), WideTag::A31);
    assert_eq!(w.get_tag().index(), 31);
    assert_eq!(w.get_a31_ptr(), Some(&31));
    assert_eq!(w.get_a0_ptr(), None);
    assert_eq!(format!("{w:?}"), "Wide::a31(31)");
    assert_eq!(w.clone(), w);

    w.emplace_a0(7);
    assert!(w.holds_a0());
    assert_ne!(w, Wide::create_a31(7));
    assert_eq!(WideTag::ALL.len(), 32);
}

#[test]
fn wide_match_reaches_every_end() {
    let pick = |w: &Wide| {
        match_union!(&*w {
            a0(v) => u32::from(*v),
            a31(v) => u32::from(*v) * 100,
            _ => 0,
        })
    };

    assert_eq!(pick(&Wide::create_a0(3)), 3);
    assert_eq!(pick(&Wide::create_a31(3)), 300);
    assert_eq!(pick(&Wide::create_a16(3)), 0);

    let moved = match_union!(Wide::create_a30(5) {
        a30(v) => v,
        _ => 0,
    });
    assert_eq!(moved, 5);
}
