//! Transformation engine backed by libav
//!
//! One job = decode the best video stream, optionally cut it to a trim range,
//! run every decoded frame through the effect chain, encode H.264 (yuv420p)
//! into an MP4 container. The best audio stream is copied packet by packet
//! over the same range. Output PTS are renumbered from zero.

mod effects;

pub use effects::EffectChain;

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

use ffmpeg_next::codec;
use ffmpeg_next::encoder;
use ffmpeg_next::format::{self, Pixel};
use ffmpeg_next::media::Type as MediaType;
use ffmpeg_next::software::scaling::{Context as ScaleCtx, Flags as ScaleFlags};
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::{Packet, Rational};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::ports::*;

/// Fallback frame rate when the container does not report one
const DEFAULT_FPS: i32 = 30;

/// Encoder settings shared by every job
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    pub crf: u8,
    pub preset: String,
    pub threads: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "medium".to_string(),
            threads: optimize_thread_count(),
        }
    }
}

/// Use 75% of the cores, between 1 and 16 threads
pub fn optimize_thread_count() -> usize {
    let cpu_count = num_cpus::get();
    let optimal_threads = (cpu_count as f64 * 0.75).ceil() as usize;
    optimal_threads.clamp(1, 16)
}

/// libav-based transformation adapter
pub struct LibavTransformAdapter {
    settings: EncoderSettings,
}

impl LibavTransformAdapter {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl TransformPort for LibavTransformAdapter {
    async fn transform(
        &self,
        request: &TransformRequest,
        cancel: CancelFlag,
    ) -> Result<TransformReport, DomainError> {
        let job = TranscodeJob {
            request: request.clone(),
            settings: self.settings.clone(),
            cancel,
        };
        tokio::task::spawn_blocking(move || job.execute())
            .await
            .map_err(|e| DomainError::InternalError(format!("Transform worker failed: {}", e)))?
    }
}

fn ff(context: &'static str) -> impl Fn(ffmpeg_next::Error) -> DomainError {
    move |e| DomainError::ProcessingError(format!("{}: {}", context, e))
}

/// Seconds to a stream timestamp
fn to_ts(seconds: f64, time_base: Rational) -> i64 {
    (seconds * time_base.denominator() as f64 / time_base.numerator() as f64) as i64
}

/// Stream timestamp to seconds
fn to_seconds(ts: i64, time_base: Rational) -> f64 {
    ts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

struct TranscodeJob {
    request: TransformRequest,
    settings: EncoderSettings,
    cancel: CancelFlag,
}

/// Converts decoded frames into encoder input, applying effects on the way
struct FramePipeline {
    effects: EffectChain,
    to_rgb: Option<ScaleCtx>,
    to_yuv: Option<ScaleCtx>,
}

impl FramePipeline {
    fn new(
        effects: EffectChain,
        source_format: Pixel,
        width: u32,
        height: u32,
    ) -> Result<Self, DomainError> {
        let (to_rgb, to_yuv) = if effects.is_empty() {
            let to_yuv = if source_format == Pixel::YUV420P {
                None
            } else {
                Some(
                    ScaleCtx::get(source_format, width, height, Pixel::YUV420P, width, height, ScaleFlags::BILINEAR)
                        .map_err(ff("Failed to create scaler"))?,
                )
            };
            (None, to_yuv)
        } else {
            let to_rgb = ScaleCtx::get(source_format, width, height, Pixel::RGB24, width, height, ScaleFlags::BILINEAR)
                .map_err(ff("Failed to create RGB scaler"))?;
            let to_yuv = ScaleCtx::get(Pixel::RGB24, width, height, Pixel::YUV420P, width, height, ScaleFlags::BILINEAR)
                .map_err(ff("Failed to create YUV scaler"))?;
            (Some(to_rgb), Some(to_yuv))
        };

        Ok(Self {
            effects,
            to_rgb,
            to_yuv,
        })
    }

    fn process(&mut self, decoded: &VideoFrame) -> Result<VideoFrame, DomainError> {
        let rgb = match self.to_rgb.as_mut() {
            Some(to_rgb) => {
                let mut rgb = VideoFrame::empty();
                to_rgb.run(decoded, &mut rgb).map_err(ff("RGB conversion failed"))?;
                let (width, height, stride) = (rgb.width() as usize, rgb.height() as usize, rgb.stride(0));
                self.effects.apply_rgb24(rgb.data_mut(0), width, height, stride);
                Some(rgb)
            }
            None => None,
        };
        let source = rgb.as_ref().unwrap_or(decoded);

        match self.to_yuv.as_mut() {
            Some(to_yuv) => {
                let mut yuv = VideoFrame::empty();
                to_yuv.run(source, &mut yuv).map_err(ff("YUV conversion failed"))?;
                Ok(yuv)
            }
            None => Ok(source.clone()),
        }
    }
}

/// Video encoder plus the bookkeeping needed to mux its packets
struct VideoSink {
    encoder: encoder::video::Encoder,
    stream_index: usize,
    encoder_tb: Rational,
    stream_tb: Rational,
    next_pts: i64,
}

impl VideoSink {
    fn send(&mut self, mut frame: VideoFrame, octx: &mut format::context::Output) -> Result<(), DomainError> {
        frame.set_pts(Some(self.next_pts));
        frame.set_kind(ffmpeg_next::picture::Type::None);
        self.next_pts += 1;
        self.encoder.send_frame(&frame).map_err(ff("Failed to send frame to encoder"))?;
        self.drain(octx)
    }

    fn drain(&mut self, octx: &mut format::context::Output) -> Result<(), DomainError> {
        let mut encoded = Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.stream_index);
            encoded.rescale_ts(self.encoder_tb, self.stream_tb);
            encoded
                .write_interleaved(octx)
                .map_err(ff("Failed to write video packet"))?;
        }
        Ok(())
    }

    fn finish(&mut self, octx: &mut format::context::Output) -> Result<(), DomainError> {
        self.encoder.send_eof().map_err(ff("Failed to flush video encoder"))?;
        self.drain(octx)
    }
}

/// Where a decoded frame sits relative to the trim window
#[derive(Debug, PartialEq)]
enum Window {
    Before,
    Inside,
    After,
}

impl TranscodeJob {
    fn execute(self) -> Result<TransformReport, DomainError> {
        let output = self.request.output_path.clone();
        let started = Instant::now();
        tracing::info!(
            job = self.request.job_id,
            kind = %self.request.kind,
            "Transform started: {} -> {}",
            self.request.input,
            output.display()
        );

        match self.run() {
            Ok(frames_written) => {
                tracing::info!(
                    job = self.request.job_id,
                    "Transform finished: {} frames in {:.2}s",
                    frames_written,
                    started.elapsed().as_secs_f64()
                );
                Ok(TransformReport {
                    output_path: output,
                    frames_written,
                    processing_time: started.elapsed(),
                })
            }
            Err(e) => {
                tracing::warn!(job = self.request.job_id, "Transform failed: {}", e);
                Self::discard(&output);
                Err(e)
            }
        }
    }

    fn discard(path: &Path) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove partial output {}: {}", path.display(), e);
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn window(&self, seconds: f64) -> Window {
        match self.request.trim {
            Some(range) if seconds < range.start_seconds() => Window::Before,
            Some(range) if seconds >= range.end_seconds() => Window::After,
            _ => Window::Inside,
        }
    }

    fn run(&self) -> Result<u64, DomainError> {
        if self.request.video_mime != VIDEO_MP4_MIME {
            return Err(DomainError::InvalidFormat(format!(
                "Unsupported output type {}, only {} is written",
                self.request.video_mime, VIDEO_MP4_MIME
            )));
        }
        let input_path = self.request.input.to_file_path();
        if !input_path.is_file() {
            return Err(DomainError::FileNotFound(input_path.display().to_string()));
        }
        if let Some(parent) = self.request.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ictx = format::input(&input_path).map_err(ff("Failed to open input"))?;
        let input_is_mp4 = ictx.format().name().split(',').any(|name| name == "mp4");

        // Input streams
        let (video_in, video_in_tb, frame_rate, decoder_params) = {
            let stream = ictx
                .streams()
                .best(MediaType::Video)
                .ok_or_else(|| DomainError::ProcessingError("No video stream found".to_string()))?;
            let rate = stream.avg_frame_rate();
            let rate = if rate.numerator() > 0 && rate.denominator() > 0 {
                rate
            } else {
                Rational::new(DEFAULT_FPS, 1)
            };
            (stream.index(), stream.time_base(), rate, stream.parameters())
        };
        let audio_in = ictx
            .streams()
            .best(MediaType::Audio)
            .map(|stream| (stream.index(), stream.time_base(), stream.parameters()));

        let mut decoder_ctx = codec::context::Context::from_parameters(decoder_params)
            .map_err(ff("Failed to create decoder context"))?;
        decoder_ctx.set_threading(codec::threading::Config::count(self.settings.threads));
        let mut decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(ff("Failed to create video decoder"))?;

        let (width, height) = (decoder.width(), decoder.height());
        let mut pipeline = FramePipeline::new(
            EffectChain::new(&self.request.effects),
            decoder.format(),
            width,
            height,
        )?;

        // Output streams
        let mut octx = format::output(&self.request.output_path).map_err(ff("Failed to create output"))?;
        let global_header = octx.format().flags().contains(format::Flags::GLOBAL_HEADER);

        let h264 = encoder::find(codec::Id::H264).ok_or_else(|| {
            DomainError::ProcessingError("H.264 encoder not found, is libx264 available?".to_string())
        })?;
        let encoder_tb = frame_rate.invert();

        let video_out = {
            let mut ost = octx.add_stream(h264).map_err(ff("Failed to add video stream"))?;
            let mut video_enc = codec::context::Context::new_with_codec(h264)
                .encoder()
                .video()
                .map_err(ff("Failed to create video encoder"))?;
            video_enc.set_width(width);
            video_enc.set_height(height);
            video_enc.set_format(Pixel::YUV420P);
            video_enc.set_time_base(encoder_tb);
            video_enc.set_frame_rate(Some(frame_rate));
            if global_header {
                video_enc.set_flags(codec::Flags::GLOBAL_HEADER);
            }

            let mut opts = ffmpeg_next::Dictionary::new();
            opts.set("crf", &self.settings.crf.to_string());
            opts.set("preset", &self.settings.preset);

            let opened = video_enc
                .open_with(opts)
                .map_err(ff("Failed to open H.264 encoder"))?;
            ost.set_parameters(&opened);
            ost.set_time_base(encoder_tb);
            (ost.index(), opened)
        };

        let audio_out = match &audio_in {
            Some((_, _, params)) => {
                let mut ost = octx
                    .add_stream(encoder::find(codec::Id::None))
                    .map_err(ff("Failed to add audio stream"))?;
                ost.set_parameters(params.clone());
                if !input_is_mp4 {
                    // SAFETY: `ost` owns these parameters and nothing else borrows them here.
                    // A zero tag lets the MP4 muxer pick one valid for its container.
                    unsafe {
                        (*ost.parameters().as_mut_ptr()).codec_tag = 0;
                    }
                }
                Some(ost.index())
            }
            None => None,
        };

        octx.set_metadata(ictx.metadata().to_owned());
        octx.write_header().map_err(ff("Failed to write output header"))?;

        let stream_tb = |octx: &format::context::Output, index: usize| {
            octx.stream(index)
                .map(|s| s.time_base())
                .ok_or_else(|| DomainError::InternalError(format!("Output stream {} missing", index)))
        };

        let (video_index, video_encoder) = video_out;
        let mut sink = VideoSink {
            encoder: video_encoder,
            stream_index: video_index,
            encoder_tb,
            stream_tb: stream_tb(&octx, video_index)?,
            next_pts: 0,
        };
        let audio_route = match (audio_in.as_ref(), audio_out) {
            (Some((index, in_tb, _)), Some(out_index)) => {
                Some((*index, *in_tb, out_index, stream_tb(&octx, out_index)?))
            }
            _ => None,
        };

        // Jump to the keyframe at or before the trim start
        if let Some(range) = self.request.trim {
            if range.start_ms > 0 {
                let target = (range.start_seconds() * ffmpeg_next::ffi::AV_TIME_BASE as f64) as i64;
                ictx.seek(target, ..target).map_err(ff("Failed to seek"))?;
            }
        }

        let start_seconds = self.request.trim.map(|r| r.start_seconds()).unwrap_or(0.0);
        let mut decoded = VideoFrame::empty();
        let mut video_done = false;

        for (stream, mut packet) in ictx.packets() {
            if self.cancelled() {
                return Err(DomainError::Cancelled);
            }

            let index = stream.index();
            if index == video_in && !video_done {
                decoder
                    .send_packet(&packet)
                    .map_err(ff("Failed to send packet to decoder"))?;
                while decoder.receive_frame(&mut decoded).is_ok() {
                    let ts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
                    match self.window(to_seconds(ts, video_in_tb)) {
                        Window::Before => continue,
                        Window::After => {
                            video_done = true;
                            break;
                        }
                        Window::Inside => {
                            let frame = pipeline.process(&decoded)?;
                            sink.send(frame, &mut octx)?;
                            if self.cancelled() {
                                return Err(DomainError::Cancelled);
                            }
                        }
                    }
                }
            } else if let Some((audio_index, in_tb, out_index, out_tb)) = audio_route {
                if index != audio_index {
                    continue;
                }
                let Some(pts) = packet.pts() else { continue };
                let window = self.window(to_seconds(pts, in_tb));
                if window == Window::After && video_done {
                    break;
                }
                if window != Window::Inside {
                    continue;
                }

                let offset = to_ts(start_seconds, in_tb);
                packet.set_pts(Some(pts - offset));
                packet.set_dts(packet.dts().map(|dts| dts - offset));
                packet.rescale_ts(in_tb, out_tb);
                packet.set_position(-1);
                packet.set_stream(out_index);
                packet
                    .write_interleaved(&mut octx)
                    .map_err(ff("Failed to write audio packet"))?;
            } else if video_done {
                break;
            }
        }

        // Frames still buffered in the decoder
        if !video_done {
            decoder.send_eof().map_err(ff("Failed to flush decoder"))?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                let ts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
                if self.window(to_seconds(ts, video_in_tb)) == Window::Inside {
                    let frame = pipeline.process(&decoded)?;
                    sink.send(frame, &mut octx)?;
                }
            }
        }

        if sink.next_pts == 0 {
            return Err(DomainError::ProcessingError(
                "No video frames in the selected range".to_string(),
            ));
        }

        sink.finish(&mut octx)?;
        octx.write_trailer().map_err(ff("Failed to write output trailer"))?;

        Ok(sink.next_pts as u64)
    }
}
