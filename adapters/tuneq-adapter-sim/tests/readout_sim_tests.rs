use tuneq_adapter_sim::{ReadoutError, ReadoutSimulator, Sampling};
use tuneq_hal::{Counts, Executor, HalError};
use tuneq_ir::{Circuit, ClbitId, QubitId};

#[test]
fn batch_preserves_order() {
    let sim = ReadoutSimulator::ideal();
    let circuits: Vec<Circuit> = (0..4u32)
        .map(|value| {
            let mut c = Circuit::with_size(format!("v{value}"), 2, 2);
            for q in 0..2 {
                if (value >> q) & 1 == 1 {
                    c.x(QubitId(q)).unwrap();
                }
            }
            c.measure_all().unwrap();
            c
        })
        .collect();

    let results = sim.execute(&circuits, 10).unwrap();
    let keys: Vec<String> = results
        .iter()
        .map(|counts| counts.most_frequent().unwrap().0.clone())
        .collect();
    assert_eq!(keys, vec!["00", "01", "10", "11"]);
}

#[test]
fn classical_adder_with_readout_noise() {
    // q2 = q0 AND q1 via Toffoli, measured into a wider classical register.
    let mut c = Circuit::with_size("and", 3, 4);
    c.x(QubitId(0)).unwrap();
    c.x(QubitId(1)).unwrap();
    c.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
    c.barrier_all().unwrap();
    c.measure(QubitId(2), ClbitId(3)).unwrap();

    let sim = ReadoutSimulator::ideal().with_qubit_error(2, ReadoutError::new(0.0, 0.25).unwrap());
    let counts = sim.execute(&[c], 400).unwrap();
    assert_eq!(counts[0], Counts::from_pairs([("1000", 300), ("0000", 100)]));
}

#[test]
fn seeded_streams_differ_by_seed() {
    let circuit = {
        let mut c = Circuit::with_size("zeros", 3, 3);
        c.measure_all().unwrap();
        c
    };
    let run = |seed| {
        ReadoutSimulator::new(ReadoutError::symmetric(0.2).unwrap())
            .with_sampling(Sampling::Seeded(seed))
            .execute(std::slice::from_ref(&circuit), 500)
            .unwrap()
    };
    assert_eq!(run(1), run(1));
    assert_ne!(run(1), run(2));
}

#[test]
fn superposition_is_unsupported() {
    let sim = ReadoutSimulator::ideal();
    let err = sim.execute(&[Circuit::ghz(3).unwrap()], 10).unwrap_err();
    assert!(matches!(err, HalError::Unsupported(_)));
}
