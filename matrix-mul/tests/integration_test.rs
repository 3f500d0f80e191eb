use approx::assert_relative_eq;
use grid_comm::{ProcessGroup, World};
use matrix_mul::{
    fox, multiply, padding, Config, Error, GridPolicy, GridTopology, Matrix, MatrixMul,
    PaddingPolicy,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn int_matrix(n: usize, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..n * n).map(|_| rng.gen_range(-5..=5) as f64).collect();
    Matrix::new(n, data).unwrap()
}

fn assert_close(got: &Matrix, want: &Matrix) {
    assert_eq!(got.n(), want.n());
    for (x, y) in got.as_slice().iter().zip(want.as_slice()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9, max_relative = 1e-6);
    }
}

#[tokio::test]
async fn test_two_by_two_single_process() {
    let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();

    let c = MatrixMul::new(1).multiply(&a, &b).await.unwrap();
    assert_eq!(c.into_rows(), vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
}

#[tokio::test]
async fn test_identity_on_two_by_two_grid() {
    let c = MatrixMul::new(4)
        .multiply(&Matrix::identity(4), &Matrix::identity(4))
        .await
        .unwrap();
    assert_eq!(c, Matrix::identity(4));
}

#[tokio::test]
async fn test_scalar_product() {
    let a = Matrix::new(1, vec![3.0]).unwrap();
    let b = Matrix::new(1, vec![-2.5]).unwrap();

    let c = MatrixMul::new(1).multiply(&a, &b).await.unwrap();
    assert_eq!(c.as_slice(), &[-7.5]);

    // Same scalar spread over a 2x2 grid: three of the four blocks are padding.
    let c = MatrixMul::new(4).multiply(&a, &b).await.unwrap();
    assert_eq!(c.as_slice(), &[-7.5]);
}

#[tokio::test]
async fn test_matches_reference_within_tolerance() {
    for procs in [1, 4, 9, 16] {
        for n in [1, 2, 3, 5, 8, 11, 13] {
            let mut rng = StdRng::seed_from_u64((procs * 100 + n) as u64);
            let a = Matrix::random(n, &mut rng);
            let b = Matrix::random(n, &mut rng);

            let c = MatrixMul::new(procs).multiply(&a, &b).await.unwrap();
            assert_close(&c, &a.reference_product(&b).unwrap());
        }
    }
}

#[tokio::test]
async fn test_padding_does_not_perturb_result() {
    // Integer entries keep every partial sum exact, so padding has to
    // contribute exactly zero.
    for policy in [PaddingPolicy::PowerOfTwo, PaddingPolicy::MultipleOfGrid] {
        let config = Config::new().with_padding(policy);
        for (procs, n) in [(4, 5), (9, 7), (9, 10), (16, 6)] {
            let a = int_matrix(n, 1);
            let b = int_matrix(n, 2);
            let c = MatrixMul::new(procs)
                .with_config(config)
                .multiply(&a, &b)
                .await
                .unwrap();
            assert_eq!(c, a.reference_product(&b).unwrap(), "procs={procs} n={n}");
        }
    }
}

#[tokio::test]
async fn test_repeated_runs_are_bit_identical() {
    let mut rng = StdRng::seed_from_u64(99);
    let a = Matrix::random(10, &mut rng);
    let b = Matrix::random(10, &mut rng);
    let mm = MatrixMul::new(9);

    let first = mm.multiply(&a, &b).await.unwrap();
    let second = mm.multiply(&a, &b).await.unwrap();
    assert_eq!(first.as_slice(), second.as_slice());
}

#[tokio::test]
async fn test_extra_ranks_sit_out() {
    let a = int_matrix(6, 3);
    let b = int_matrix(6, 4);
    let expected = a.reference_product(&b).unwrap();

    for procs in [2, 3, 5, 8, 10] {
        let c = MatrixMul::new(procs).multiply(&a, &b).await.unwrap();
        assert_eq!(c, expected, "procs={procs}");
    }

    // Only the coordinator reports a result; rank 4 is off the 2x2 grid.
    let operands = std::sync::Arc::new((a, b));
    let outcomes = World::run(5, move |comm| {
        let operands = std::sync::Arc::clone(&operands);
        async move {
            let input = (comm.rank() == 0).then(|| (&operands.0, &operands.1));
            multiply(&comm, input, &Config::default()).await
        }
    })
    .await
    .unwrap();
    assert!(outcomes[0].is_some());
    assert!(outcomes[1..].iter().all(Option::is_none));
}

#[tokio::test]
async fn test_strict_grid_rejects_on_every_rank() {
    let a = Matrix::identity(3);
    let config = Config::new().with_grid(GridPolicy::RequireSquare);

    let err = MatrixMul::new(3)
        .with_config(config)
        .multiply(&a, &a)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotPerfectSquare { procs: 3, grid: 1 }));

    // Every rank rejects on its own, before sending anything.
    let operands = std::sync::Arc::new(a);
    let rejections = World::run(3, move |comm| {
        let operands = std::sync::Arc::clone(&operands);
        async move {
            let input = (comm.rank() == 0).then(|| (&*operands, &*operands));
            let outcome = multiply(&comm, input, &config).await;
            Ok::<_, Error>(matches!(outcome, Err(Error::NotPerfectSquare { .. })))
        }
    })
    .await
    .unwrap();
    assert_eq!(rejections, vec![true, true, true]);
}

#[tokio::test]
async fn test_rank_failure_fails_whole_run() {
    let a = int_matrix(4, 5);
    let b = int_matrix(4, 6);
    let operands = std::sync::Arc::new((a, b));

    let err = World::run(4, move |comm| {
        let operands = std::sync::Arc::clone(&operands);
        async move {
            let input = (comm.rank() == 0).then(|| (&operands.0, &operands.1));
            let config = Config::default();
            let Some(topology) = GridTopology::build(&comm, config.grid).await? else {
                return Ok::<_, Error>(None);
            };
            let (_, own_a, local_b) =
                padding::scatter(topology.grid(), input, config.padding).await?;

            // Grid rank 3 drops out before the rounds start.
            if topology.grid().comm().rank() == 3 {
                return Err(Error::MissingResult);
            }
            let local_c =
                fox::broadcast_multiply_rotate(topology.row(), topology.col(), &own_a, local_b)
                    .await?;
            Ok(Some(local_c))
        }
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::MissingResult));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_rank_failure_reported_under_threads() {
    let operands = std::sync::Arc::new((int_matrix(8, 7), int_matrix(8, 8)));

    for _ in 0..100 {
        let operands = std::sync::Arc::clone(&operands);
        let err = World::run(16, move |comm| {
            let operands = std::sync::Arc::clone(&operands);
            async move {
                let input = (comm.rank() == 0).then(|| (&operands.0, &operands.1));
                let config = Config::default();
                let Some(topology) = GridTopology::build(&comm, config.grid).await? else {
                    return Ok::<_, Error>(None);
                };
                let (layout, own_a, local_b) =
                    padding::scatter(topology.grid(), input, config.padding).await?;
                if topology.grid().comm().rank() == 5 {
                    return Err(Error::MissingResult);
                }
                let local_c =
                    fox::broadcast_multiply_rotate(topology.row(), topology.col(), &own_a, local_b)
                        .await?;
                matrix_mul::gather::gather(topology.grid(), &layout, local_c).await
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::MissingResult), "got {err:?}");
    }
}

#[tokio::test]
async fn test_coordinator_requires_operands() {
    let err = World::run(1, |comm| async move {
        multiply(&comm, None, &Config::default()).await
    })
    .await
    .unwrap_err();
    assert!(matches!(err, Error::MissingOperands));
}

#[tokio::test]
async fn test_input_validation() {
    let err = MatrixMul::new(4)
        .multiply(&Matrix::identity(2), &Matrix::identity(3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch(2, 3)));

    let config = Config::new().with_padding(PaddingPolicy::MultipleOfGrid);
    let mm = MatrixMul::new(3).with_config(config);
    assert_eq!(mm.procs(), 3);
    assert_eq!(mm.grid_dim(), 1);
    assert_eq!(mm.config().padding, PaddingPolicy::MultipleOfGrid);

    let err = MatrixMul::new(0)
        .multiply(&Matrix::identity(2), &Matrix::identity(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoProcesses));

    let err = MatrixMul::new(1)
        .multiply(&Matrix::zeros(0), &Matrix::zeros(0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyMatrix));
}
