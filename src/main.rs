use snake2048::engine::{self, Board};
use snake2048::expectimax::Expectimax;

fn main() {
    engine::new();
    let mut policy = Expectimax::new();
    let mut rng = rand::thread_rng();
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    println!("{board}");
    let mut move_count = 0u32;
    let mut total_nodes = 0u64;
    let mut peak_nodes = 0u64;
    while let Some(dir) = policy.best_move(board) {
        board = board.make_move(dir, &mut rng);
        move_count += 1;
        println!("{board}");
        let stats = policy.last_stats();
        total_nodes = total_nodes.saturating_add(stats.nodes);
        peak_nodes = peak_nodes.max(stats.nodes);
    }
    println!(
        "Moves made: {}, Highest tile: {}, States considered: {}, Max states considered for a move: {}",
        move_count,
        board.highest_tile(),
        total_nodes,
        peak_nodes
    );
}
