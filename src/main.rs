fn main() -> eframe::Result {
    inpainter::run_native()
}
