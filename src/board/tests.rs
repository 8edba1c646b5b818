use super::*;

fn sq(notation: &str) -> Square {
    Square::from_notation(notation).unwrap()
}

#[test]
fn test_zobrist_hashing_is_equal_for_transpositions() {
    let mut board1 = Board::starting_position();
    let mut board2 = Board::starting_position();
    assert_eq!(board1.to_key(), board2.to_key());

    let board1_moves = [("b9", "c7"), ("b0", "c2"), ("h9", "g7"), ("h0", "g2")];
    let board2_moves = [("h9", "g7"), ("h0", "g2"), ("b9", "c7"), ("b0", "c2")];

    let mut undo1 = vec![];
    let mut undo2 = vec![];
    for ((f1, t1), (f2, t2)) in board1_moves.iter().zip(board2_moves.iter()) {
        let moved1 = board1.get(sq(f1)).unwrap();
        let moved2 = board2.get(sq(f2)).unwrap();
        undo1.push((sq(f1), sq(t1), moved1, board1.apply_move(sq(f1), sq(t1)).unwrap()));
        undo2.push((sq(f2), sq(t2), moved2, board2.apply_move(sq(f2), sq(t2)).unwrap()));
    }
    println!("{}", board1);
    assert_eq!(board1.to_key(), board2.to_key());
    assert_eq!(board1, board2);

    for (from, to, moved, captured) in undo1.into_iter().rev() {
        board1.undo_move(from, to, moved, captured);
    }
    assert_eq!(board1.to_key(), Board::starting_position().to_key());
}

#[test]
fn test_apply_and_undo_capture_restores_key() {
    let mut board = Board::starting_position();
    let before = board.to_key();
    // red cannon takes the horse on h0, screened by the black cannon on h2
    let from = sq("h7");
    let to = sq("h0");
    let moved = board.get(from).unwrap();
    let captured = board.apply_move(from, to).unwrap();
    println!("{}", board);
    assert_eq!(captured, Some((Piece::Horse, Color::Black)));
    assert_ne!(board.to_key(), before);

    board.undo_move(from, to, moved, captured);
    assert_eq!(board.to_key(), before, "undo should restore the exact key");
    assert_eq!(board, Board::starting_position());
}

#[test]
fn test_apply_from_empty_square_errors() {
    let mut board = Board::starting_position();
    let result = board.apply_move(sq("e5"), sq("e4"));
    assert_eq!(
        result,
        Err(BoardError::FromSquareIsEmptyMoveApplicationError { square: sq("e5") })
    );
    assert_eq!(
        board.apply_move(Square::new(10, 0), sq("e4")),
        Err(BoardError::OutOfBoundsError { row: 10, col: 0 })
    );
}

#[test]
fn test_piece_at_out_of_bounds_is_empty() {
    let board = Board::starting_position();
    assert_eq!(board.piece_at(-1, 0), None);
    assert_eq!(board.piece_at(0, 9), None);
    assert_eq!(board.piece_at(9, 4), Some((Piece::King, Color::Red)));
    assert_eq!(board.piece_at(2, 1), Some((Piece::Cannon, Color::Black)));
}

#[test]
fn test_put_on_occupied_square_errors() {
    let mut board = Board::starting_position();
    assert!(board.put(sq("e9"), Piece::Pawn, Color::Red).is_err());
}

#[test]
fn test_starting_position_counts() {
    let board = Board::starting_position();
    assert_eq!(board.piece_count(), 32);
    assert_eq!(board.piece_counts(Color::Red), [1, 2, 2, 2, 2, 2, 5]);
    assert_eq!(board.find_king(Color::Black), Some(sq("e0")));
    assert!(board.check_piece_count_legality().is_ok());
}

#[test]
fn test_piece_count_legality() {
    let board = xiangqi_position! {
        ...akr...
        .........
        .........
        .........
        .........
        .........
        .........
        .........
        .........
        rr..K....
    };
    println!("{}", board);
    assert_eq!(
        board.check_piece_count_legality(),
        Err(BoardError::TooManyPiecesError {
            piece: Piece::Chariot,
            color: Color::Black,
            count: 3
        })
    );
}

#[test]
fn test_starting_position_is_symmetric_under_mirroring() {
    let board = Board::starting_position();
    assert_eq!(board.mirrored(), board);
    assert_eq!(board.mirrored().to_key(), board.to_key());
}

#[test]
fn test_mirrored_swaps_colors_and_squares() {
    let board = xiangqi_position! {
        ...k.....
        .........
        .........
        .........
        .........
        .........
        .........
        .........
        R........
        .....K...
    };
    let mirrored = board.mirrored();
    println!("{}", mirrored);
    assert_eq!(mirrored.get(sq("i1")), Some((Piece::Chariot, Color::Black)));
    assert_eq!(mirrored.find_king(Color::Black), Some(sq("d0")));
    assert_eq!(mirrored.find_king(Color::Red), Some(sq("f9")));
}
