use std::fmt::Debug;

use divan;
use polybox::polybox;
use polybox::space::*;
use polybox::PolyBox;

fn main() {
    divan::main();
}

#[divan::bench]
fn polybox_small_item_small_space() {
    divan::black_box({
        let small: PolyBox<dyn Debug, S1> = polybox!(divan::black_box(true));
        small
    });
}

#[divan::bench]
fn polybox_small_item_large_space() {
    divan::black_box({
        let small: PolyBox<dyn Debug, S64> = polybox!(divan::black_box(true));
        small
    });
}

#[divan::bench]
fn polybox_large_item_small_space() {
    divan::black_box({
        let large: PolyBox<dyn Debug, S1> = polybox!(divan::black_box([0usize; 64]));
        large
    });
}

#[divan::bench]
fn polybox_large_item_large_space() {
    divan::black_box({
        let large: PolyBox<dyn Debug, S64> = polybox!(divan::black_box([0usize; 64]));
        large
    });
}

#[divan::bench]
fn polybox_clone_inline() -> PolyBox<dyn Debug, S64> {
    let small: PolyBox<dyn Debug, S64> = polybox!(divan::black_box([1usize; 8]));
    PolyBox::clone(divan::black_box(&small))
}

#[divan::bench]
fn polybox_clone_heap() -> PolyBox<dyn Debug, S1> {
    let large: PolyBox<dyn Debug, S1> = polybox!(divan::black_box([1usize; 8]));
    PolyBox::clone(divan::black_box(&large))
}

#[divan::bench]
fn box_small_item() {
    divan::black_box({
        let small: Box<dyn Debug> = Box::new(divan::black_box(true));
        small
    });
}

#[divan::bench]
fn box_large_item() {
    divan::black_box({
        let large: Box<dyn Debug> = Box::new(divan::black_box([0usize; 64]));
        large
    });
}
