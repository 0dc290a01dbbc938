//! Metadata checksums.
//!
//! HDF5 protects the superblock, object headers and other v2 metadata with
//! Bob Jenkins' lookup3 `hashlittle` (seed 0), not CRC32.

use byteorder::{ByteOrder, LittleEndian};

/// Jenkins lookup3 `hashlittle` of `data` with a zero seed.
pub fn jenkins_lookup3(data: &[u8]) -> u32 {
    let seed = 0xdead_beefu32.wrapping_add(data.len() as u32);
    let mut state = State {
        a: seed,
        b: seed,
        c: seed,
    };

    let mut rest = data;
    while rest.len() > 12 {
        state.absorb(&rest[..12]);
        state.mix();
        rest = &rest[12..];
    }

    if rest.is_empty() {
        return state.c;
    }

    // The final block is zero-extended; the additions match lookup3's
    // fall-through tail handling byte for byte.
    let mut block = [0u8; 12];
    block[..rest.len()].copy_from_slice(rest);
    state.absorb(&block);
    state.finish();
    state.c
}

struct State {
    a: u32,
    b: u32,
    c: u32,
}

impl State {
    fn absorb(&mut self, block: &[u8]) {
        self.a = self.a.wrapping_add(LittleEndian::read_u32(&block[0..4]));
        self.b = self.b.wrapping_add(LittleEndian::read_u32(&block[4..8]));
        self.c = self.c.wrapping_add(LittleEndian::read_u32(&block[8..12]));
    }

    fn mix(&mut self) {
        let State { a, b, c } = self;
        *a = a.wrapping_sub(*c) ^ c.rotate_left(4);
        *c = c.wrapping_add(*b);
        *b = b.wrapping_sub(*a) ^ a.rotate_left(6);
        *a = a.wrapping_add(*c);
        *c = c.wrapping_sub(*b) ^ b.rotate_left(8);
        *b = b.wrapping_add(*a);
        *a = a.wrapping_sub(*c) ^ c.rotate_left(16);
        *c = c.wrapping_add(*b);
        *b = b.wrapping_sub(*a) ^ a.rotate_left(19);
        *a = a.wrapping_add(*c);
        *c = c.wrapping_sub(*b) ^ b.rotate_left(4);
        *b = b.wrapping_add(*a);
    }

    fn finish(&mut self) {
        let State { a, b, c } = self;
        *c = (*c ^ *b).wrapping_sub(b.rotate_left(14));
        *a = (*a ^ *c).wrapping_sub(c.rotate_left(11));
        *b = (*b ^ *a).wrapping_sub(a.rotate_left(25));
        *c = (*c ^ *b).wrapping_sub(b.rotate_left(16));
        *a = (*a ^ *c).wrapping_sub(c.rotate_left(4));
        *b = (*b ^ *a).wrapping_sub(a.rotate_left(14));
        *c = (*c ^ *b).wrapping_sub(b.rotate_left(24));
    }
}
