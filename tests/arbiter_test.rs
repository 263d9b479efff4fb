//! Tests for the turn arbiter state machine.

use tictactoe_broker::{
    Arbiter, BrokerMessage, Dispatch, Move, Outcome, Phase, Piece, Position, RejectReason, Seat,
    SubmitError, Verdict,
};

fn piece(symbol: char) -> Piece {
    Piece::new(symbol).expect("valid piece")
}

/// A 3x3 game where the first seat plays O and the second plays X.
fn started() -> Arbiter {
    let mut arbiter = Arbiter::new(3, 3);
    arbiter.start([piece('O'), piece('X')]).expect("fresh arbiter");
    arbiter
}

fn play(arbiter: &mut Arbiter, seat: Seat, symbol: char, row: usize, col: usize) -> Verdict {
    arbiter
        .submit(seat, Move::new(piece(symbol), Position::new(row, col)))
        .expect("game in progress")
}

/// Plays alternating moves, first seat first.
fn play_all(arbiter: &mut Arbiter, moves: &[(char, usize, usize)]) -> Vec<Verdict> {
    let mut seat = Seat::First;
    moves
        .iter()
        .map(|&(symbol, row, col)| {
            let verdict = play(arbiter, seat, symbol, row, col);
            seat = seat.other();
            verdict
        })
        .collect()
}

fn rejection(to: Seat, row: usize, col: usize, reason: RejectReason) -> Vec<Dispatch> {
    vec![Dispatch::new(
        to,
        BrokerMessage::MoveRejected {
            position: Some(Position::new(row, col)),
            reason,
        },
    )]
}

#[test]
fn test_start_announces_pieces_and_order() {
    let mut arbiter = Arbiter::new(3, 4);
    assert_eq!(arbiter.phase(), Phase::AwaitingPlayers);

    let dispatches = arbiter.start([piece('O'), piece('X')]).expect("fresh arbiter");
    assert_eq!(arbiter.phase(), Phase::InProgress);
    assert_eq!(
        dispatches,
        vec![
            Dispatch::new(
                Seat::First,
                BrokerMessage::GameStarted {
                    piece: piece('O'),
                    opponent: piece('X'),
                    turn_order: 0,
                    rows: 3,
                    cols: 4,
                },
            ),
            Dispatch::new(
                Seat::Second,
                BrokerMessage::GameStarted {
                    piece: piece('X'),
                    opponent: piece('O'),
                    turn_order: 1,
                    rows: 3,
                    cols: 4,
                },
            ),
        ]
    );
    assert_eq!(arbiter.start([piece('O'), piece('X')]), Err(SubmitError::AlreadyStarted));
}

#[test]
fn test_moves_before_start_refused() {
    let mut arbiter = Arbiter::new(3, 3);
    let result = arbiter.submit(Seat::First, Move::new(piece('O'), Position::new(0, 0)));
    assert_eq!(result, Err(SubmitError::NotStarted));
}

#[test]
fn test_successful_move_notifies_both_and_passes_turn() {
    let mut arbiter = started();
    let verdict = play(&mut arbiter, Seat::First, 'O', 1, 2);

    assert_eq!(verdict.outcome, Some(Outcome::InProgress));
    assert_eq!(
        verdict.dispatches,
        vec![
            Dispatch::new(Seat::First, BrokerMessage::Placed { position: Position::new(1, 2) }),
            Dispatch::new(
                Seat::Second,
                BrokerMessage::OpponentMoved { position: Position::new(1, 2) }
            ),
        ]
    );
    assert_eq!(arbiter.to_move(), Seat::Second);
    assert_eq!(arbiter.history().len(), 1);
}

#[test]
fn test_row_win_scenario() {
    let mut arbiter = started();
    let verdicts = play_all(
        &mut arbiter,
        &[('O', 0, 0), ('X', 1, 1), ('O', 0, 1), ('X', 2, 2), ('O', 0, 2)],
    );

    let last = verdicts.last().expect("five verdicts");
    assert_eq!(last.outcome, Some(Outcome::Win(piece('O'))));
    assert!(last.is_final());
    assert_eq!(
        last.dispatches,
        vec![
            Dispatch::new(Seat::First, BrokerMessage::Win),
            Dispatch::new(Seat::Second, BrokerMessage::Lose),
        ]
    );
    assert_eq!(arbiter.phase(), Phase::Finished(Outcome::Win(piece('O'))));
    assert!(verdicts[..4].iter().all(|v| !v.is_final()));
}

#[test]
fn test_stalemate_scenario() {
    let mut arbiter = started();
    let verdicts = play_all(
        &mut arbiter,
        &[
            ('O', 0, 0),
            ('X', 0, 1),
            ('O', 0, 2),
            ('X', 1, 1),
            ('O', 1, 0),
            ('X', 1, 2),
            ('O', 2, 1),
            ('X', 2, 0),
            ('O', 2, 2),
        ],
    );

    let last = verdicts.last().expect("nine verdicts");
    assert_eq!(last.outcome, Some(Outcome::Stalemate));
    assert_eq!(
        last.dispatches,
        vec![
            Dispatch::new(Seat::First, BrokerMessage::Stalemate),
            Dispatch::new(Seat::Second, BrokerMessage::Stalemate),
        ]
    );
    assert!(arbiter.grid().is_full());
}

#[test]
fn test_win_on_last_cell_beats_stalemate() {
    let mut arbiter = started();
    let verdicts = play_all(
        &mut arbiter,
        &[
            ('O', 0, 0),
            ('X', 1, 0),
            ('O', 0, 1),
            ('X', 1, 1),
            ('O', 1, 2),
            ('X', 2, 1),
            ('O', 2, 0),
            ('X', 2, 2),
            ('O', 0, 2),
        ],
    );

    assert!(arbiter.grid().is_full());
    let last = verdicts.last().expect("nine verdicts");
    assert_eq!(last.outcome, Some(Outcome::Win(piece('O'))));
    assert_eq!(last.dispatches[0], Dispatch::new(Seat::First, BrokerMessage::Win));
}

#[test]
fn test_out_of_bounds_rejected_to_mover_only() {
    let mut arbiter = started();
    let before = arbiter.grid().clone();

    let verdict = play(&mut arbiter, Seat::First, 'O', 5, 5);
    assert_eq!(verdict.outcome, None);
    assert_eq!(verdict.dispatches, rejection(Seat::First, 5, 5, RejectReason::OutOfBoard));
    assert_eq!(arbiter.grid(), &before);
    assert_eq!(arbiter.to_move(), Seat::First);
}

#[test]
fn test_occupied_rejected_and_turn_kept() {
    let mut arbiter = started();
    play(&mut arbiter, Seat::First, 'O', 0, 0);

    let verdict = play(&mut arbiter, Seat::Second, 'X', 0, 0);
    assert_eq!(verdict.dispatches, rejection(Seat::Second, 0, 0, RejectReason::Occupied));
    assert_eq!(arbiter.to_move(), Seat::Second);

    // The same player simply tries again.
    let verdict = play(&mut arbiter, Seat::Second, 'X', 1, 1);
    assert_eq!(verdict.outcome, Some(Outcome::InProgress));
    assert_eq!(arbiter.to_move(), Seat::First);
}

#[test]
fn test_second_consecutive_move_rejected() {
    let mut arbiter = started();
    play(&mut arbiter, Seat::First, 'O', 0, 0);
    let before = arbiter.grid().clone();

    let verdict = play(&mut arbiter, Seat::First, 'O', 2, 2);
    assert_eq!(verdict.dispatches, rejection(Seat::First, 2, 2, RejectReason::NotYourTurn));
    assert_eq!(arbiter.grid(), &before);
    assert_eq!(arbiter.to_move(), Seat::Second);
}

#[test]
fn test_wrong_piece_rejected() {
    let mut arbiter = started();
    let verdict = play(&mut arbiter, Seat::First, 'X', 0, 0);
    assert_eq!(verdict.dispatches, rejection(Seat::First, 0, 0, RejectReason::WrongPiece));
    assert_eq!(arbiter.grid().occupied(), 0);
}

#[test]
fn test_malformed_request_answered_to_sender() {
    let arbiter = started();
    let verdict = arbiter.reject_malformed(Seat::Second).expect("in progress");
    assert_eq!(
        verdict.dispatches,
        vec![Dispatch::new(
            Seat::Second,
            BrokerMessage::MoveRejected {
                position: None,
                reason: RejectReason::Malformed,
            },
        )]
    );
}

#[test]
fn test_finished_game_refuses_moves() {
    let mut arbiter = started();
    play_all(
        &mut arbiter,
        &[('O', 0, 0), ('X', 1, 0), ('O', 0, 1), ('X', 1, 1), ('O', 0, 2)],
    );

    let result = arbiter.submit(Seat::Second, Move::new(piece('X'), Position::new(1, 2)));
    assert_eq!(result, Err(SubmitError::GameOver));
    assert_eq!(arbiter.reject_malformed(Seat::Second), Err(SubmitError::GameOver));
}

#[test]
fn test_identical_moves_give_identical_notifications() {
    let moves = [
        ('X', 0, 0),
        ('O', 1, 1),
        ('O', 2, 2),
        ('O', 0, 0),
        ('X', 0, 1),
        ('O', 1, 0),
        ('X', 9, 9),
        ('X', 0, 2),
        ('O', 2, 0),
    ];

    let run = || {
        let mut arbiter = started();
        let mut seat = Seat::First;
        let mut log = Vec::new();
        for &(symbol, row, col) in &moves {
            let Ok(verdict) = arbiter.submit(seat, Move::new(piece(symbol), Position::new(row, col)))
            else {
                break;
            };
            if verdict.outcome.is_some() {
                seat = seat.other();
            }
            log.extend(verdict.dispatches);
        }
        log
    };

    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}

#[test]
fn test_anti_diagonal_win_on_wide_grid() {
    let mut arbiter = Arbiter::new(2, 3);
    arbiter.start([piece('O'), piece('X')]).expect("fresh arbiter");

    let verdicts = play_all(&mut arbiter, &[('O', 0, 2), ('X', 0, 0), ('O', 1, 1)]);
    let last = verdicts.last().expect("three verdicts");
    assert_eq!(last.outcome, Some(Outcome::Win(piece('O'))));
    assert_eq!(arbiter.phase(), Phase::Finished(Outcome::Win(piece('O'))));
}
