fn main() {
    gvm::term::main();
}
