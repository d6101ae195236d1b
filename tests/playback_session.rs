mod common;

use std::time::Duration;
use tokio::time::Instant;
use narration_studio::commands::StudioCommand;
use narration_studio::playback::{PlaybackMode, AUDITION_RATE};
use narration_studio::{PlayerState, Stream};
use common::{Harness, OutputEvent};

const GAP: Duration = Duration::from_millis(500);

/// Сценарий из пяти предложений; второе и четвёртое не синтезируются
async fn synthesized_with_gaps() -> Harness {
    let h = Harness::new();
    h.load_script("Zero. FAIL one. Two. FAIL three. Four.").await;
    h.session.synthesize_all(None).await.unwrap();
    h
}

/// Доиграть прогон, сообщая об окончании каждого клипа; возвращает
/// номера клипов в порядке воспроизведения
async fn drain_run(h: &Harness) -> Vec<usize> {
    let clips = h.session.clips();
    let mut visited = Vec::new();
    let mut seen_plays = 0;

    while h.session.player_status().state == PlayerState::Playing {
        let plays = h.output.plays();
        assert_eq!(plays.len(), seen_plays + 1, "exactly one new clip per step");
        seen_plays = plays.len();
        let (stream, source, _, generation) = plays[plays.len() - 1].clone();
        assert_eq!(stream, Stream::Run);

        let index = clips
            .iter()
            .position(|clip| clip.audio.as_ref() == Some(&source))
            .unwrap();
        visited.push(index);

        let finished_at = Instant::now();
        h.session.clip_finished(Stream::Run, generation).await;
        if h.session.player_status().state == PlayerState::Playing {
            assert!(finished_at.elapsed() >= GAP);
        }
    }
    visited
}

#[tokio::test(start_paused = true)]
async fn test_play_all_visits_audio_clips_in_order() {
    let h = synthesized_with_gaps().await;

    h.session.dispatch(StudioCommand::PlayAll).await.unwrap();
    assert_eq!(drain_run(&h).await, vec![0, 2, 4]);

    let status = h.session.player_status();
    assert_eq!(status.state, PlayerState::Idle);
    assert_eq!(status.position, None);
}

#[tokio::test(start_paused = true)]
async fn test_play_from_index_skips_earlier_clips() {
    let h = synthesized_with_gaps().await;

    h.session.dispatch(StudioCommand::PlayFrom(1)).await.unwrap();
    assert_eq!(drain_run(&h).await, vec![2, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_play_from_without_audio_is_rejected() {
    let h = Harness::new();
    h.load_script("Not synthesized. Neither is this.").await;

    let err = h.session.dispatch(StudioCommand::PlayAll).await.unwrap_err();
    assert!(err.is_user_facing());
    assert!(h.output.plays().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_audition_ignores_run_speed_and_toggles() {
    let h = synthesized_with_gaps().await;
    let clips = h.session.clips();
    h.session.dispatch(StudioCommand::SetSpeed(1.5)).await.unwrap();

    h.session.dispatch(StudioCommand::Audition(clips[2].id)).await.unwrap();
    let (stream, _, rate, _) = h.output.last_play().unwrap();
    assert_eq!(stream, Stream::Audition);
    assert_eq!(rate, AUDITION_RATE);

    h.session.dispatch(StudioCommand::Audition(clips[2].id)).await.unwrap();
    assert_eq!(h.output.events.lock().last(), Some(&OutputEvent::Stop(Stream::Audition)));
    assert_eq!(h.session.player_status().state, PlayerState::Idle);

    h.session.dispatch(StudioCommand::PlayAll).await.unwrap();
    let (stream, _, rate, _) = h.output.last_play().unwrap();
    assert_eq!(stream, Stream::Run);
    assert_eq!(rate, 1.5);
}

#[tokio::test(start_paused = true)]
async fn test_run_and_audition_are_exclusive() {
    let h = synthesized_with_gaps().await;
    let clips = h.session.clips();

    h.session.dispatch(StudioCommand::PlayAll).await.unwrap();
    h.session.dispatch(StudioCommand::Audition(clips[4].id)).await.unwrap();

    let events = h.output.events.lock().clone();
    let stop_run = events.iter().position(|e| *e == OutputEvent::Stop(Stream::Run)).unwrap();
    let audition = events
        .iter()
        .position(|e| matches!(e, OutputEvent::Play { stream: Stream::Audition, .. }))
        .unwrap();
    assert!(stop_run < audition);
    assert_eq!(h.session.player_status().mode, Some(PlaybackMode::SingleClip));
}

#[tokio::test(start_paused = true)]
async fn test_transport_controls() {
    let h = synthesized_with_gaps().await;
    h.session.dispatch(StudioCommand::PlayAll).await.unwrap();

    h.session.dispatch(StudioCommand::PlayerNext).await.unwrap();
    assert_eq!(h.session.player_status().position, Some(2));
    h.session.dispatch(StudioCommand::PlayerNext).await.unwrap();
    assert_eq!(h.session.player_status().position, Some(4));
    let at_end = h.session.dispatch(StudioCommand::PlayerNext).await.unwrap();
    assert!(!at_end.is_applied());

    h.session.dispatch(StudioCommand::Seek(0.5)).await.unwrap();
    assert_eq!(
        h.output.events.lock().last(),
        Some(&OutputEvent::Seek(Stream::Run, Duration::from_secs(1)))
    );

    h.session.dispatch(StudioCommand::PlayerToggle).await.unwrap();
    assert_eq!(h.session.player_status().state, PlayerState::Paused);
    h.session.dispatch(StudioCommand::PlayerPrev).await.unwrap();
    assert_eq!(h.session.player_status().position, Some(2));
    let plays_before = h.output.plays().len();

    h.session.dispatch(StudioCommand::PlayerToggle).await.unwrap();
    assert_eq!(h.session.player_status().state, PlayerState::Playing);
    assert_eq!(h.output.plays().len(), plays_before + 1);

    h.session.dispatch(StudioCommand::ClosePlayer).await.unwrap();
    let status = h.session.player_status();
    assert_eq!(status.state, PlayerState::Idle);
    assert_eq!(status.position, None);
}

/// Остановка во время паузы между клипами: следующий клип не начинается
#[tokio::test(start_paused = true)]
async fn test_stop_during_gap_cancels_advance() {
    let h = synthesized_with_gaps().await;
    h.session.dispatch(StudioCommand::PlayAll).await.unwrap();
    let (_, _, _, generation) = h.output.last_play().unwrap();

    let session = h.session.clone();
    let finish = tokio::spawn(async move { session.clip_finished(Stream::Run, generation).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.session.dispatch(StudioCommand::StopPlayback).await.unwrap();
    finish.await.unwrap();

    assert_eq!(h.output.plays().len(), 1);
    assert_eq!(h.session.player_status().state, PlayerState::Idle);
}

/// Повторное прослушивание берёт аудио из кэша
#[tokio::test(start_paused = true)]
async fn test_cached_audio_is_reused() {
    let h = synthesized_with_gaps().await;
    let id = h.session.clips()[0].id;

    h.session.dispatch(StudioCommand::Audition(id)).await.unwrap();
    h.session.dispatch(StudioCommand::Audition(id)).await.unwrap();
    h.session.dispatch(StudioCommand::Audition(id)).await.unwrap();

    assert_eq!(h.loader.loads.lock().len(), 1);
    assert_eq!(h.output.plays().len(), 2);
    assert!(h.session.inspect(|s| s.narration().cache().contains(id)));
}

/// Битые файлы пропускаются, прогон доходит до конца
#[tokio::test(start_paused = true)]
async fn test_unreadable_audio_is_skipped() {
    let h = Harness::new();
    let path = h.write("broken.txt", "First. Second. Third.");
    h.session.load_script(&path).await.unwrap();
    h.session.synthesize_all(None).await.unwrap();

    let outcome = h.session.dispatch(StudioCommand::PlayAll).await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!(h.loader.loads.lock().len(), 3);
    assert!(h.output.plays().is_empty());
    assert_eq!(h.session.player_status().state, PlayerState::Idle);
}
