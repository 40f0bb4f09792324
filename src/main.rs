// The event loop and drawing are based on the game of life automata
//https://github.com/parasyte/pixels/tree/c2454b01abc11c007d4b9de8525195af942fef0d/examples/conway

#![deny(clippy::all)]
#![forbid(unsafe_code)]

use pixels::Error;

mod auxiliary;
mod projects;

fn main() -> Result<(), Error> {
    println!("\nConway's Game of Life");
    println!("\nControls for animation:\nC: clear screen\nP: pause\nR: randomize screen\nSPACE: frame by frame\nESC: close screen");
    projects::life::run_life()
}
